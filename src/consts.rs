//
// Copyright 2017-2026 Hans W. Uhlig. All Rights Reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//      http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//

//! Stable numeric constants for Telnet command bytes and option identifiers.
//!
//! Values are the IANA-assigned constants per RFC 854 and the IANA Telnet
//! Option Registry; nothing here is configurable.

/// Interpret-As-Command. Signals that the following byte is a command.
pub const IAC: u8 = 0xFF;
/// End of subnegotiation parameters.
pub const SE: u8 = 0xF0;
/// No operation.
pub const NOP: u8 = 0xF1;
/// Data Mark. Synch-point byte.
pub const DM: u8 = 0xF2;
/// Break.
pub const BRK: u8 = 0xF3;
/// Interrupt process.
pub const IP: u8 = 0xF4;
/// Abort output.
pub const AO: u8 = 0xF5;
/// Are you there.
pub const AYT: u8 = 0xF6;
/// Erase character.
pub const EC: u8 = 0xF7;
/// Erase line.
pub const EL: u8 = 0xF8;
/// Go ahead.
pub const GA: u8 = 0xF9;
/// Begin subnegotiation parameters.
pub const SB: u8 = 0xFA;
/// Indicates willingness to perform an option.
pub const WILL: u8 = 0xFB;
/// Refusal to perform an option.
pub const WONT: u8 = 0xFC;
/// Request the peer perform an option.
pub const DO: u8 = 0xFD;
/// Demand the peer stop performing an option.
pub const DONT: u8 = 0xFE;
/// End of record.
pub const EOR: u8 = 0xEF;

/// Carriage return.
pub const CR: u8 = 0x0D;
/// Line feed.
pub const LF: u8 = 0x0A;
/// Null.
pub const NUL: u8 = 0x00;

/// Named option identifiers from the IANA Telnet Option Registry.
///
/// Only the options this engine names or negotiates internally get a
/// constant; every other id in `0x00..=0xFF` is still addressable through
/// `TelnetOption::Unknown`.
pub mod option {
    /// Binary Transmission (RFC 856).
    pub const BINARY: u8 = 0;
    /// Echo (RFC 857).
    pub const ECHO: u8 = 1;
    /// Reconnection.
    pub const RECONNECTION: u8 = 2;
    /// Suppress Go Ahead (RFC 858).
    pub const SUPPRESS_GO_AHEAD: u8 = 3;
    /// Approx Message Size Negotiation.
    pub const APPROX_MESSAGE_SIZE: u8 = 4;
    /// Status (RFC 859).
    pub const STATUS: u8 = 5;
    /// Timing Mark (RFC 860).
    pub const TIMING_MARK: u8 = 6;
    /// Remote Controlled Trans and Echo.
    pub const RCTE: u8 = 7;
    /// Output Line Width.
    pub const OUT_LINE_WIDTH: u8 = 8;
    /// Output Page Size.
    pub const OUT_PAGE_SIZE: u8 = 9;
    /// Output Carriage-Return Disposition.
    pub const NAOCRD: u8 = 10;
    /// Output Horizontal Tab Stops.
    pub const NAOHTS: u8 = 11;
    /// Output Horizontal Tab Disposition.
    pub const NAOHTD: u8 = 12;
    /// Output Formfeed Disposition.
    pub const NAOFFD: u8 = 13;
    /// Output Vertical Tabstops.
    pub const NAOVTS: u8 = 14;
    /// Output Vertical Tab Disposition.
    pub const NAOVTD: u8 = 15;
    /// Output Linefeed Disposition.
    pub const NAOLFD: u8 = 16;
    /// Extended ASCII.
    pub const XASCII: u8 = 17;
    /// Logout.
    pub const LOGOUT: u8 = 18;
    /// Byte Macro.
    pub const BYTE_MACRO: u8 = 19;
    /// Data Entry Terminal.
    pub const DET: u8 = 20;
    /// SUPDUP.
    pub const SUPDUP: u8 = 21;
    /// SUPDUP Output.
    pub const SUPDUP_OUTPUT: u8 = 22;
    /// Send Location.
    pub const SEND_LOCATION: u8 = 23;
    /// Terminal Type.
    pub const TERMINAL_TYPE: u8 = 24;
    /// End of Record (RFC 885).
    pub const END_OF_RECORD: u8 = 25;
    /// TACACS User Identification.
    pub const TUID: u8 = 26;
    /// Output Marking.
    pub const OUTMRK: u8 = 27;
    /// Terminal Location Number.
    pub const TTYLOC: u8 = 28;
    /// Telnet 3270 Regime.
    pub const OPT_3270_REGIME: u8 = 29;
    /// X.3 PAD.
    pub const X3_PAD: u8 = 30;
    /// Negotiate About Window Size (RFC 1073).
    pub const NAWS: u8 = 31;
    /// Terminal Speed.
    pub const TSPEED: u8 = 32;
    /// Remote Flow Control.
    pub const LFLOW: u8 = 33;
    /// Linemode (RFC 1184).
    pub const LINEMODE: u8 = 34;
    /// X Display Location.
    pub const XDISPLOC: u8 = 35;
    /// Environment Option (old).
    pub const ENVIRONMENT: u8 = 36;
    /// Authentication.
    pub const AUTHENTICATION: u8 = 37;
    /// Encryption.
    pub const ENCRYPTION: u8 = 38;
    /// New Environment Option.
    pub const NEW_ENVIRONMENT: u8 = 39;
    /// TN3270E.
    pub const TN3270E: u8 = 40;
    /// XAUTH.
    pub const XAUTH: u8 = 41;
    /// Charset (RFC 2066).
    pub const CHARSET: u8 = 42;
    /// Remote Serial Port.
    pub const TRSP: u8 = 43;
    /// Com Port Control Option.
    pub const CPCO: u8 = 44;
    /// Telnet Suppress Local Echo.
    pub const TSLE: u8 = 45;
    /// Telnet Start TLS.
    pub const START_TLS: u8 = 46;
    /// Kermit.
    pub const KERMIT: u8 = 47;
    /// Send-URL.
    pub const SEND_URL: u8 = 48;
    /// Forward X.
    pub const FORWARD_X: u8 = 49;
    /// MUD Server Data Protocol.
    pub const MSDP: u8 = 69;
    /// MUD Server Status Protocol.
    pub const MSSP: u8 = 70;
    /// Compress.
    pub const COMPRESS1: u8 = 85;
    /// Compress2 (MCCP2).
    pub const COMPRESS2: u8 = 86;
    /// Zenith Mud Protocol.
    pub const ZMP: u8 = 93;
    /// Pragmatic Logon.
    pub const PRAGMA_LOGON: u8 = 138;
    /// SSPI Logon.
    pub const SSPI_LOGON: u8 = 139;
    /// Pragmatic Heartbeat.
    pub const PRAGMA_HEARTBEAT: u8 = 140;
    /// Generic Mud Communication Protocol.
    pub const GMCP: u8 = 201;
    /// Extended-Options-List.
    pub const EXOPL: u8 = 255;

    /// Subcommands of the STATUS subnegotiation (RFC 859).
    pub mod status {
        /// Request the peer send its view of our option state.
        pub const SEND: u8 = 1;
        /// Report our view of the peer's (or our own) option state.
        pub const IS: u8 = 0;
    }
}
