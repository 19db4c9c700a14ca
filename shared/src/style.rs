//! Display styles - small cyclic enums toggled from the keyboard
//!
//! Each style is a fixed, ordered list of variants. Stepping forward past the
//! last variant wraps to the first, and stepping back from the first wraps
//! to the last.

/// A closed set of variants with a fixed order and wrap-around stepping
pub trait Cyclic: Copy + PartialEq + Sized + 'static {
    /// Every variant, in stepping order
    const ALL: &'static [Self];

    /// Position of this variant in [`Cyclic::ALL`]
    fn index(self) -> usize {
        Self::ALL
            .iter()
            .position(|&variant| variant == self)
            .unwrap_or(0)
    }

    /// The following variant, wrapping to the first
    fn next(self) -> Self {
        Self::ALL[(self.index() + 1) % Self::ALL.len()]
    }

    /// The preceding variant, wrapping to the last
    fn previous(self) -> Self {
        let len = Self::ALL.len();
        Self::ALL[(self.index() + len - 1) % len]
    }
}

/// How the date-time in each zone header is formatted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum FormatStyle {
    /// `3:04PM, Mon Jan 02, 2006` (or 24-hour when military time is on)
    #[default]
    Default,
    /// `2006-01-02T15:04:05+07:00`
    Iso8601,
    /// `Mon Jan  2 15:04:05 MST 2006`
    UnixDetailed,
}

impl Cyclic for FormatStyle {
    const ALL: &'static [Self] = &[Self::Default, Self::Iso8601, Self::UnixDetailed];
}

/// How each zone label is decorated with offset information
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ZoneStyle {
    /// `(CET) Paris`
    #[default]
    AbbreviationOnly,
    /// `(CET) Paris [UTC+01:00]`
    WithUtcOffset,
    /// `(CET) Paris [Local+01:00]`
    WithOffsetRelativeToLocal,
}

impl Cyclic for ZoneStyle {
    const ALL: &'static [Self] = &[
        Self::AbbreviationOnly,
        Self::WithUtcOffset,
        Self::WithOffsetRelativeToLocal,
    ];
}
