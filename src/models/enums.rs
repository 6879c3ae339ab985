use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

str_enum!(UrgencyLevel {
    Critica => "CRITICA",
    MuitoAlta => "MUITO ALTA",
    Alta => "ALTA",
    Moderada => "MODERADA",
    Baixa => "BAIXA",
});

impl UrgencyLevel {
    /// Fixed display order, most urgent first. Charts follow this order.
    pub const ORDERED: [UrgencyLevel; 5] = [
        UrgencyLevel::Critica,
        UrgencyLevel::MuitoAlta,
        UrgencyLevel::Alta,
        UrgencyLevel::Moderada,
        UrgencyLevel::Baixa,
    ];
}

str_enum!(ExamModality {
    RessonanciaMagnetica => "RESSONANCIA MAGNETICA",
    TomografiaComputadorizada => "TOMOGRAFIA COMPUTADORIZADA",
    PetCt => "PET-CT",
    Mamografia => "MAMOGRAFIA",
    Radiologia => "RADIOLOGIA",
});

str_enum!(MedicalSpecialty {
    Mamaria => "ONCOLOGIA MAMARIA",
    Toracica => "ONCOLOGIA TORACICA",
    Abdominal => "ONCOLOGIA ABDOMINAL",
    Urologica => "ONCOLOGIA UROLOGICA",
    Neuro => "NEURO-ONCOLOGIA",
    Radiologica => "ONCOLOGIA RADIOLOGICA",
});
