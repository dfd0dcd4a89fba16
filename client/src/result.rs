// Calyx Ledger Client
// Copyright (C) 2020 Calyx Project Developers <dev@calyx.network>
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License version 3 as
// published by the Free Software Foundation.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.

//! Decode terminal results out of gateway execution-result entries.
//!
//! An executed submission produces result entries whose data field encodes
//! the return code and return values as `@hex(code)@hex(value)…`, e.g.
//! `@6f6b@2a` for a call that succeeded with the single return value `42`.

use calyx_core::status::{ExitStatus, TerminalResult};

use crate::error::Error;

/// Parse a result data field into the return code and the raw return values.
pub fn parse_result_data(data: &str) -> Result<(String, Vec<Vec<u8>>), Error> {
    let mut segments = data.split('@');
    match segments.next() {
        Some("") => {}
        _ => {
            return Err(malformed(data, "missing leading separator"));
        }
    }
    let code_hex = segments
        .next()
        .ok_or_else(|| malformed(data, "missing return code"))?;
    let code_bytes =
        hex::decode(code_hex).map_err(|_| malformed(data, "return code is not hex"))?;
    let code = String::from_utf8(code_bytes)
        .map_err(|_| malformed(data, "return code is not utf-8"))?;

    let return_data = segments
        .map(|segment| hex::decode(segment).map_err(|_| malformed(data, "value is not hex")))
        .collect::<Result<Vec<_>, _>>()?;
    Ok((code, return_data))
}

/// Assemble a [TerminalResult] from a result entry's data and message.
pub fn terminal_result_from_entry(data: &str, message: Option<&str>) -> Result<TerminalResult, Error> {
    let (code, return_data) = parse_result_data(data)?;
    let status = ExitStatus::from_return_code(&code);
    if status.is_success() {
        Ok(TerminalResult::success(return_data))
    } else {
        Ok(TerminalResult::failure(
            status,
            message.unwrap_or(code.as_str()),
        ))
    }
}

fn malformed(data: &str, reason: &str) -> Error {
    Error::Other(format!("malformed result data {:?}: {}", data, reason))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn parse_success_with_value() {
        let (code, data) = parse_result_data("@6f6b@2a").unwrap();
        assert_eq!(code, "ok");
        assert_eq!(data, vec![vec![42]]);
    }

    #[test]
    fn parse_success_without_values() {
        let (code, data) = parse_result_data("@6f6b").unwrap();
        assert_eq!(code, "ok");
        assert!(data.is_empty());
    }

    #[test]
    fn parse_rejects_missing_separator() {
        assert!(parse_result_data("6f6b@2a").is_err());
    }

    #[test]
    fn user_error_entry_becomes_failure() {
        // "user error" hex-encoded
        let result =
            terminal_result_from_entry("@75736572206572726f72", Some("wrong ticket price"))
                .unwrap();
        assert_eq!(result.status, ExitStatus::UserError);
        assert_eq!(result.message, "wrong ticket price");
        assert!(result.return_data.is_empty());
    }
}
