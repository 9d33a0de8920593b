//! Boundary-condition keywords of the Neutral Map File format.

use std::fmt;

use serde::Serialize;

/// Boundary-condition kind attached to an NMF entry.
///
/// `OneToOne` marks an internal interface; every other kind marks a
/// single-sided boundary patch.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum BcType {
    Collapsed,
    OneToOne,
    Patched,
    PoleDir1,
    PoleDir2,
    SymX,
    SymY,
    SymZ,
    Unprocessed,
    Wall,
    Sym,
    Inflow,
    Outflow,
}

impl BcType {
    /// Normalize a raw keyword: uppercase, `-` treated as `_`.
    pub fn formalize(raw: &str) -> String {
        raw.trim()
            .chars()
            .map(|c| if c == '-' { '_' } else { c.to_ascii_uppercase() })
            .collect()
    }

    /// Parse a keyword, case-insensitively. `SYMMETRY` is accepted as an
    /// alias of `SYM`. Returns `None` for anything outside the fixed set.
    pub fn from_keyword(raw: &str) -> Option<Self> {
        match Self::formalize(raw).as_str() {
            "COLLAPSED" => Some(Self::Collapsed),
            "ONE_TO_ONE" => Some(Self::OneToOne),
            "PATCHED" => Some(Self::Patched),
            "POLE_DIR1" => Some(Self::PoleDir1),
            "POLE_DIR2" => Some(Self::PoleDir2),
            "SYM_X" => Some(Self::SymX),
            "SYM_Y" => Some(Self::SymY),
            "SYM_Z" => Some(Self::SymZ),
            "UNPROCESSED" => Some(Self::Unprocessed),
            "WALL" => Some(Self::Wall),
            "SYM" | "SYMMETRY" => Some(Self::Sym),
            "INFLOW" => Some(Self::Inflow),
            "OUTFLOW" => Some(Self::Outflow),
            _ => None,
        }
    }

    /// Canonical uppercase keyword used when writing an NMF.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Collapsed => "COLLAPSED",
            Self::OneToOne => "ONE_TO_ONE",
            Self::Patched => "PATCHED",
            Self::PoleDir1 => "POLE_DIR1",
            Self::PoleDir2 => "POLE_DIR2",
            Self::SymX => "SYM_X",
            Self::SymY => "SYM_Y",
            Self::SymZ => "SYM_Z",
            Self::Unprocessed => "UNPROCESSED",
            Self::Wall => "WALL",
            Self::Sym => "SYM",
            Self::Inflow => "INFLOW",
            Self::Outflow => "OUTFLOW",
        }
    }

    /// True for the kind that links two block surfaces.
    pub fn is_interface(self) -> bool {
        matches!(self, Self::OneToOne)
    }
}

impl fmt::Display for BcType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyword_normalization() {
        assert_eq!(BcType::from_keyword("wall"), Some(BcType::Wall));
        assert_eq!(BcType::from_keyword("One-To-One"), Some(BcType::OneToOne));
        assert_eq!(BcType::from_keyword("pole-dir1"), Some(BcType::PoleDir1));
        assert_eq!(BcType::from_keyword("SYMMETRY"), Some(BcType::Sym));
        assert_eq!(BcType::from_keyword("symmetry"), Some(BcType::Sym));
        assert_eq!(BcType::from_keyword("FREESTREAM"), None);
    }

    #[test]
    fn canonical_keywords_round_trip() {
        for bc in [
            BcType::Collapsed,
            BcType::OneToOne,
            BcType::Patched,
            BcType::PoleDir1,
            BcType::PoleDir2,
            BcType::SymX,
            BcType::SymY,
            BcType::SymZ,
            BcType::Unprocessed,
            BcType::Wall,
            BcType::Sym,
            BcType::Inflow,
            BcType::Outflow,
        ] {
            assert_eq!(BcType::from_keyword(bc.keyword()), Some(bc));
        }
    }
}
