//! Instruction Set Architecture (ISA) Identification.
//!
//! Parses the per-core ISA strings of the `machine` parameter (e.g. `RV32I`,
//! `RV64GC`) into a base width and extension set. Instruction semantics are not
//! modelled; the ISA determines the register width (which bounds the start
//! address) and labels the core in diagnostics.
//!
//! # Extensions
//!
//! * `I`: Base Integer Instruction Set (required).
//! * `M`: Integer Multiplication and Division.
//! * `A`: Atomic Instructions.
//! * `F`: Single-Precision Floating-Point.
//! * `D`: Double-Precision Floating-Point (requires `F`).
//! * `C`: Compressed Instructions.
//! * `G`: Shorthand for `IMAFD`.

use std::fmt;
use std::str::FromStr;

use crate::common::ConfigError;

/// Base integer register width.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Xlen {
    /// 32-bit registers (`RV32`).
    Rv32,
    /// 64-bit registers (`RV64`).
    Rv64,
}

impl Xlen {
    /// Returns the register width in bits.
    pub const fn bits(self) -> u32 {
        match self {
            Self::Rv32 => 32,
            Self::Rv64 => 64,
        }
    }

    /// Returns the largest address representable in this width.
    pub const fn max_address(self) -> u64 {
        match self {
            Self::Rv32 => u32::MAX as u64,
            Self::Rv64 => u64::MAX,
        }
    }
}

/// Set of standard extensions enabled on a core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct Extensions(u8);

impl Extensions {
    /// Base integer instructions.
    pub const I: Self = Self(1 << 0);
    /// Integer multiply/divide.
    pub const M: Self = Self(1 << 1);
    /// Atomics.
    pub const A: Self = Self(1 << 2);
    /// Single-precision floating point.
    pub const F: Self = Self(1 << 3);
    /// Double-precision floating point.
    pub const D: Self = Self(1 << 4);
    /// Compressed instructions.
    pub const C: Self = Self(1 << 5);
    /// The `G` shorthand.
    pub const G: Self = Self(Self::I.0 | Self::M.0 | Self::A.0 | Self::F.0 | Self::D.0);

    /// Canonical extension order used when printing.
    const ORDER: [(Self, char); 6] = [
        (Self::I, 'I'),
        (Self::M, 'M'),
        (Self::A, 'A'),
        (Self::F, 'F'),
        (Self::D, 'D'),
        (Self::C, 'C'),
    ];

    /// Returns `true` if every extension in `other` is enabled.
    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    /// Returns the union of both sets.
    #[must_use]
    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    fn from_letter(letter: char) -> Option<Self> {
        match letter {
            'I' => Some(Self::I),
            'M' => Some(Self::M),
            'A' => Some(Self::A),
            'F' => Some(Self::F),
            'D' => Some(Self::D),
            'C' => Some(Self::C),
            'G' => Some(Self::G),
            _ => None,
        }
    }
}

/// ISA of one simulated core.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Isa {
    /// Base register width.
    pub xlen: Xlen,
    /// Enabled extensions.
    pub extensions: Extensions,
}

impl Isa {
    /// Returns `true` if `addr` can be held in a register of this ISA.
    pub const fn fits_address(&self, addr: u64) -> bool {
        addr <= self.xlen.max_address()
    }

    /// Returns `true` if the given extension set is enabled.
    pub const fn has(&self, ext: Extensions) -> bool {
        self.extensions.contains(ext)
    }
}

impl FromStr for Isa {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let reject = |reason: &str| ConfigError::Isa {
            isa: s.to_string(),
            reason: reason.to_string(),
        };

        let upper = s.trim().to_ascii_uppercase();
        let (xlen, letters) = if let Some(rest) = upper.strip_prefix("RV32") {
            (Xlen::Rv32, rest)
        } else if let Some(rest) = upper.strip_prefix("RV64") {
            (Xlen::Rv64, rest)
        } else {
            return Err(reject("expected an RV32 or RV64 prefix"));
        };

        if letters.is_empty() {
            return Err(reject("no extensions listed"));
        }

        let mut extensions = Extensions::default();
        for letter in letters.chars() {
            let ext = Extensions::from_letter(letter)
                .ok_or_else(|| reject(&format!("unsupported extension `{letter}`")))?;
            extensions = extensions.union(ext);
        }

        if !extensions.contains(Extensions::I) {
            return Err(reject("base integer extension `I` is required"));
        }
        if extensions.contains(Extensions::D) && !extensions.contains(Extensions::F) {
            return Err(reject("extension `D` requires `F`"));
        }

        Ok(Self { xlen, extensions })
    }
}

impl fmt::Display for Isa {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RV{}", self.xlen.bits())?;
        for (ext, letter) in Extensions::ORDER {
            if self.extensions.contains(ext) {
                write!(f, "{letter}")?;
            }
        }
        Ok(())
    }
}
