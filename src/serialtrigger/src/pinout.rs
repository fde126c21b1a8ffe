// SPDX-FileCopyrightText: 2025 Stanislaw Grams <stanislawgrams@gmail.com>
//
// SPDX-License-Identifier: BSD-2-Clause

/// DB-25 and DE-9 connector pinout, printed by `--pinout`.
pub const PINOUT: &str = "\
DB-25 and DE-9 pinout

25-pin  9-pin  Description                           Direction
 1             Protective Ground (PG)
 2      3      Transmitted Data (TxD)                DCE <- DTE
 3      2      Received Data (RxD)                   DCE -> DTE
 4      7      Request To Send (RTS)                 DCE <- DTE
 5      8      Clear To Send (CTS)                   DCE -> DTE
 6      6      Data Set Ready (DSR)                  DCE -> DTE
 7      5      Signal Ground (SG)
 8      1      Data Carrier Detect (DCD)             DCE -> DTE
12             Secondary Data Carrier Detect (SDCD)  DCE -> DTE
13             Secondary Clear To Send (SCTS)        DCE -> DTE
14             Secondary Transmitted Data (STD)      DCE <- DTE
16             Secondary Received Data (SRD)         DCE -> DTE
19             Secondary Request To Send (SRTS)      DCE <- DTE
20      4      Data Terminal Ready (DTR)             DCE <- DTE
22      9      Ring Indicator (RI)                   DCE -> DTE
";
