//! Chest label-map conventions.
//!
//! A label-map voxel is a packed 16-bit value: the low byte holds the
//! anatomical region id and the high byte holds the tissue type id. Regions
//! are hierarchical (lobes and thirds lie within a lung, the lungs within the
//! whole lung); the hierarchy is a fixed table shared read-only by everything
//! that consults it.

/// Anatomical chest regions, stored in the low byte of a label value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChestRegion {
    Undefined = 0,
    WholeLung = 1,
    RightLung = 2,
    LeftLung = 3,
    RightSuperiorLobe = 4,
    RightMiddleLobe = 5,
    RightInferiorLobe = 6,
    LeftSuperiorLobe = 7,
    LeftInferiorLobe = 8,
    LeftUpperThird = 9,
    LeftMiddleThird = 10,
    LeftLowerThird = 11,
    RightUpperThird = 12,
    RightMiddleThird = 13,
    RightLowerThird = 14,
}

/// Tissue types, stored in the high byte of a label value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ChestType {
    Undefined = 0,
    NormalParenchyma = 1,
    Airway = 2,
    Vessel = 3,
    Emphysematous = 4,
    GroundGlass = 5,
    Reticular = 6,
    Nodular = 7,
    ObliqueFissure = 8,
    HorizontalFissure = 9,
    MildParaseptalEmphysema = 10,
    ModerateParaseptalEmphysema = 11,
    SevereParaseptalEmphysema = 12,
    MildBulla = 13,
    ModerateBulla = 14,
    SevereBulla = 15,
    MildCentrilobularEmphysema = 16,
    ModerateCentrilobularEmphysema = 17,
    SevereCentrilobularEmphysema = 18,
    MildPanlobularEmphysema = 19,
    ModeratePanlobularEmphysema = 20,
    SeverePanlobularEmphysema = 21,
    AirwayWallThickening = 22,
    AirwayCylindricalDilation = 23,
    VaricoseBronchiectasis = 24,
    CysticBronchiectasis = 25,
    CentrilobularNodule = 26,
    Mosaicing = 27,
    ExpiratoryMalacia = 28,
    SaberSheath = 29,
    Outpouching = 30,
    MucoidMaterial = 31,
    PatchyGasTrapping = 32,
    DiffuseGasTrapping = 33,
    LinearScar = 34,
    Cyst = 35,
    Atelectasis = 36,
    Honeycombing = 37,
    AirwayGeneration0 = 38,
    AirwayGeneration1 = 39,
    AirwayGeneration2 = 40,
    AirwayGeneration3 = 41,
    AirwayGeneration4 = 42,
    AirwayGeneration5 = 43,
    AirwayGeneration6 = 44,
    AirwayGeneration7 = 45,
    AirwayGeneration8 = 46,
}

impl ChestRegion {
    /// All enumerated regions in discriminant order.
    pub const ALL: [ChestRegion; 15] = [
        ChestRegion::Undefined,
        ChestRegion::WholeLung,
        ChestRegion::RightLung,
        ChestRegion::LeftLung,
        ChestRegion::RightSuperiorLobe,
        ChestRegion::RightMiddleLobe,
        ChestRegion::RightInferiorLobe,
        ChestRegion::LeftSuperiorLobe,
        ChestRegion::LeftInferiorLobe,
        ChestRegion::LeftUpperThird,
        ChestRegion::LeftMiddleThird,
        ChestRegion::LeftLowerThird,
        ChestRegion::RightUpperThird,
        ChestRegion::RightMiddleThird,
        ChestRegion::RightLowerThird,
    ];

    /// Look up a region by its byte value. Unknown values map to `None`.
    pub fn from_u8(value: u8) -> Option<ChestRegion> {
        ChestRegion::ALL.get(value as usize).copied()
    }

    /// The region directly above this one in the hierarchy. The whole lung
    /// tops out at `Undefined`.
    pub fn parent(self) -> ChestRegion {
        match self {
            ChestRegion::LeftSuperiorLobe
            | ChestRegion::LeftInferiorLobe
            | ChestRegion::LeftUpperThird
            | ChestRegion::LeftMiddleThird
            | ChestRegion::LeftLowerThird => ChestRegion::LeftLung,
            ChestRegion::RightSuperiorLobe
            | ChestRegion::RightMiddleLobe
            | ChestRegion::RightInferiorLobe
            | ChestRegion::RightUpperThird
            | ChestRegion::RightMiddleThird
            | ChestRegion::RightLowerThird => ChestRegion::RightLung,
            ChestRegion::LeftLung | ChestRegion::RightLung => ChestRegion::WholeLung,
            ChestRegion::WholeLung | ChestRegion::Undefined => ChestRegion::Undefined,
        }
    }

    /// Whether `self` lies within `superior`, walking the hierarchy upward.
    /// Every region is considered to lie within the whole lung.
    pub fn is_within(self, superior: ChestRegion) -> bool {
        if self == superior || superior == ChestRegion::WholeLung {
            return true;
        }
        let mut current = self;
        while current != ChestRegion::WholeLung && current != ChestRegion::Undefined {
            current = current.parent();
            if current == superior {
                return true;
            }
        }
        false
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChestRegion::Undefined => "Undefined",
            ChestRegion::WholeLung => "WholeLung",
            ChestRegion::RightLung => "RightLung",
            ChestRegion::LeftLung => "LeftLung",
            ChestRegion::RightSuperiorLobe => "RightSuperiorLobe",
            ChestRegion::RightMiddleLobe => "RightMiddleLobe",
            ChestRegion::RightInferiorLobe => "RightInferiorLobe",
            ChestRegion::LeftSuperiorLobe => "LeftSuperiorLobe",
            ChestRegion::LeftInferiorLobe => "LeftInferiorLobe",
            ChestRegion::LeftUpperThird => "LeftUpperThird",
            ChestRegion::LeftMiddleThird => "LeftMiddleThird",
            ChestRegion::LeftLowerThird => "LeftLowerThird",
            ChestRegion::RightUpperThird => "RightUpperThird",
            ChestRegion::RightMiddleThird => "RightMiddleThird",
            ChestRegion::RightLowerThird => "RightLowerThird",
        }
    }
}

impl ChestType {
    /// All enumerated types in discriminant order.
    pub const ALL: [ChestType; 47] = [
        ChestType::Undefined,
        ChestType::NormalParenchyma,
        ChestType::Airway,
        ChestType::Vessel,
        ChestType::Emphysematous,
        ChestType::GroundGlass,
        ChestType::Reticular,
        ChestType::Nodular,
        ChestType::ObliqueFissure,
        ChestType::HorizontalFissure,
        ChestType::MildParaseptalEmphysema,
        ChestType::ModerateParaseptalEmphysema,
        ChestType::SevereParaseptalEmphysema,
        ChestType::MildBulla,
        ChestType::ModerateBulla,
        ChestType::SevereBulla,
        ChestType::MildCentrilobularEmphysema,
        ChestType::ModerateCentrilobularEmphysema,
        ChestType::SevereCentrilobularEmphysema,
        ChestType::MildPanlobularEmphysema,
        ChestType::ModeratePanlobularEmphysema,
        ChestType::SeverePanlobularEmphysema,
        ChestType::AirwayWallThickening,
        ChestType::AirwayCylindricalDilation,
        ChestType::VaricoseBronchiectasis,
        ChestType::CysticBronchiectasis,
        ChestType::CentrilobularNodule,
        ChestType::Mosaicing,
        ChestType::ExpiratoryMalacia,
        ChestType::SaberSheath,
        ChestType::Outpouching,
        ChestType::MucoidMaterial,
        ChestType::PatchyGasTrapping,
        ChestType::DiffuseGasTrapping,
        ChestType::LinearScar,
        ChestType::Cyst,
        ChestType::Atelectasis,
        ChestType::Honeycombing,
        ChestType::AirwayGeneration0,
        ChestType::AirwayGeneration1,
        ChestType::AirwayGeneration2,
        ChestType::AirwayGeneration3,
        ChestType::AirwayGeneration4,
        ChestType::AirwayGeneration5,
        ChestType::AirwayGeneration6,
        ChestType::AirwayGeneration7,
        ChestType::AirwayGeneration8,
    ];

    /// Look up a type by its byte value. Unknown values map to `None`.
    pub fn from_u8(value: u8) -> Option<ChestType> {
        ChestType::ALL.get(value as usize).copied()
    }
}

/// Pack a region and type into a 16-bit label value: low byte region id,
/// high byte type id. The inverse of [`unpack`], exactly.
pub fn pack(region: ChestRegion, chest_type: ChestType) -> u16 {
    (region as u16) | ((chest_type as u16) << 8)
}

/// Split a 16-bit label value into its raw (region, type) bytes.
pub fn unpack(value: u16) -> (u8, u8) {
    ((value & 0x00ff) as u8, (value >> 8) as u8)
}

/// The region encoded in a label value. Bytes outside the enumerated range
/// (vendor extensions, corrupt data) decode as `Undefined`.
pub fn region_of(value: u16) -> ChestRegion {
    let (region, _) = unpack(value);
    ChestRegion::from_u8(region).unwrap_or(ChestRegion::Undefined)
}

/// The tissue type encoded in a label value, `Undefined` for unknown bytes.
pub fn type_of(value: u16) -> ChestType {
    let (_, chest_type) = unpack(value);
    ChestType::from_u8(chest_type).unwrap_or(ChestType::Undefined)
}
