// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

//! RS-232 control lines as seen through the modem-control register.
//!
//! Bit positions follow the conventional `TIOCM_*` layout so a raw register
//! value round-trips unchanged. Bits without a name here (LE, ST, SR, OUT1,
//! OUT2, LOOP) are retained, never dropped.

use std::fmt;

use bitflags::bitflags;

bitflags! {
    /// Snapshot of the modem-control register.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ControlLines: u32 {
        /// Data Terminal Ready (DTE -> DCE)
        const DTR = 0x002;
        /// Request To Send (DTE -> DCE)
        const RTS = 0x004;
        /// Clear To Send (DCE -> DTE)
        const CTS = 0x020;
        /// Data Carrier Detect (DCE -> DTE)
        const DCD = 0x040;
        /// Ring Indicator (DCE -> DTE)
        const RI = 0x080;
        /// Data Set Ready (DCE -> DTE)
        const DSR = 0x100;

        const _ = !0;
    }
}

impl ControlLines {
    /// Lines driven by the DCE; read-only from our side.
    pub const INPUTS: Self = Self::CTS.union(Self::DCD).union(Self::DSR).union(Self::RI);
    /// Lines driven by us.
    pub const OUTPUTS: Self = Self::DTR.union(Self::RTS);

    /// Only the named input lines of this snapshot.
    pub fn inputs(self) -> Self {
        self.intersection(Self::INPUTS)
    }

    /// Only the named output lines of this snapshot.
    pub fn outputs(self) -> Self {
        self.intersection(Self::OUTPUTS)
    }
}

impl fmt::Display for ControlLines {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(name)?;
            first = false;
        }
        if first {
            f.write_str("none")?;
        }
        Ok(())
    }
}

/// A monitored DCE -> DTE line.
///
/// The declaration order is the evaluation order for commands and exits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputLine {
    Cts,
    Dcd,
    Dsr,
    Ri,
}

impl InputLine {
    /// All monitored lines in evaluation order.
    pub const ALL: [InputLine; 4] = [Self::Cts, Self::Dcd, Self::Dsr, Self::Ri];

    /// Register bit for this line.
    pub fn line(self) -> ControlLines {
        match self {
            Self::Cts => ControlLines::CTS,
            Self::Dcd => ControlLines::DCD,
            Self::Dsr => ControlLines::DSR,
            Self::Ri => ControlLines::RI,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Cts => "CTS",
            Self::Dcd => "DCD",
            Self::Dsr => "DSR",
            Self::Ri => "RI",
        }
    }

    /// Whether this line is asserted in `lines`.
    pub fn is_asserted(self, lines: ControlLines) -> bool {
        lines.contains(self.line())
    }
}

impl fmt::Display for InputLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}
