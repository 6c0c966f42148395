//! Closed enumerations persisted downstream by their integer code.
//!
//! The codes are part of the external contract: never renumber a variant.

use serde::{Deserialize, Serialize};

/// Error returned when an integer does not map to a known variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} code: {code}")]
pub struct UnknownCode {
    pub kind: &'static str,
    pub code: u8,
}

macro_rules! coded_enum {
    (
        $(#[$meta:meta])*
        pub enum $name:ident {
            $($variant:ident = $code:literal,)+
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(into = "u8", try_from = "u8")]
        pub enum $name {
            $($variant = $code,)+
        }

        impl $name {
            /// Stable integer code of this variant.
            pub const fn code(self) -> u8 {
                self as u8
            }
        }

        impl From<$name> for u8 {
            fn from(value: $name) -> Self {
                value.code()
            }
        }

        impl TryFrom<u8> for $name {
            type Error = UnknownCode;

            fn try_from(code: u8) -> Result<Self, Self::Error> {
                match code {
                    $($code => Ok(Self::$variant),)+
                    _ => Err(UnknownCode { kind: stringify!($name), code }),
                }
            }
        }
    };
}

coded_enum! {
    pub enum EquipmentId {
        Lift = 1,
        AirConditioner = 2,
        CentralHeating = 3,
        Furnished = 4,
        EquippedKitchen = 5,
        SolarPanel = 6,
    }
}

coded_enum! {
    pub enum InfrastructureId {
        Garage = 1,
        Terrace = 3,
        StorageRoom = 6,
        Pool = 7,
        Garden = 8,
        Balcony = 9,
    }
}

coded_enum! {
    pub enum PurchaseType {
        Sale = 1,
        Rent = 2,
    }
}

coded_enum! {
    /// Defaults to `Used` whenever the listing does not say otherwise.
    pub enum PropertyConditionId {
        New = 1,
        Used = 2,
        UnderConstruction = 3,
        ForRefurbish = 4,
        ToDemolish = 5,
    }
}

coded_enum! {
    /// Portuguese room-count code. `Other` when no T0..T7 token is found.
    pub enum TypologyId {
        T0 = 0,
        T1 = 1,
        T2 = 2,
        T3 = 3,
        T4 = 4,
        T5 = 5,
        T6 = 6,
        T7 = 7,
        Other = 8,
    }
}

coded_enum! {
    pub enum PropertyTypeId {
        House = 1,
        Apartment = 2,
        Plot = 3,
        Shop = 4,
        Office = 5,
        Building = 6,
        Warehouse = 7,
        Other = 10,
    }
}

coded_enum! {
    pub enum PropertySubTypeId {
        NewDevelopment = 1,
        Penthouse = 2,
        Duplex = 3,
        Loft = 4,
        NewDevelopmentHouse = 5,
        SemiDetached = 6,
        Detached = 7,
        Estate = 8,
        Urban = 9,
        Buildable = 10,
        Rustic = 11,
        Residential = 12,
        MixedUse = 13,
        Commercial = 14,
        Hotel = 15,
    }
}

coded_enum! {
    pub enum FloorTypeId {
        LastFloor = 1,
        MiddleFloor = 2,
        GroundFloor = 3,
    }
}

coded_enum! {
    pub enum LicenseTypeId {
        Approved = 1,
        OnApproval = 2,
    }
}

impl Default for PropertyConditionId {
    fn default() -> Self {
        Self::Used
    }
}

impl Default for TypologyId {
    fn default() -> Self {
        Self::Other
    }
}
