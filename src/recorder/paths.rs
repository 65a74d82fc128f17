//! Output file naming
//!
//! Per-call files land in `<root>/<dst>/<year>/<mm>/<dd>/` as
//! `<HHMMSS>-<src>[-<callsign>].<ext>`; the daily aggregate sits next to
//! them as `<yyyymmdd>-<dst>.<ext>`.

use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDateTime, Timelike};

use crate::protocol::rewind::SuperHeader;

/// Directory holding a call's recordings
#[must_use]
pub fn call_directory(root: &Path, header: &SuperHeader, started: &NaiveDateTime) -> PathBuf {
    root.join(header.dst_id.to_string())
        .join(started.year().to_string())
        .join(format!("{:02}", started.month()))
        .join(format!("{:02}", started.day()))
}

/// Per-call recording path
#[must_use]
pub fn call_file(
    root: &Path,
    header: &SuperHeader,
    started: &NaiveDateTime,
    extension: &str,
) -> PathBuf {
    let callsign = header.src_call.trimmed();
    let suffix = if callsign.is_empty() {
        String::new()
    } else {
        format!("-{}", callsign.to_lowercase())
    };
    let name = format!(
        "{:02}{:02}{:02}-{}{}.{}",
        started.hour(),
        started.minute(),
        started.second(),
        header.src_id,
        suffix,
        extension
    );
    call_directory(root, header, started).join(name)
}

/// Daily aggregate path for the directory a call file lives in
#[must_use]
pub fn aggregate_file(
    call_file: &Path,
    header: &SuperHeader,
    started: &NaiveDateTime,
    extension: &str,
) -> PathBuf {
    let name = format!(
        "{}{:02}{:02}-{}.{}",
        started.year(),
        started.month(),
        started.day(),
        header.dst_id,
        extension
    );
    call_file
        .parent()
        .map_or_else(|| PathBuf::from(&name), |dir| dir.join(&name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::rewind::{Callsign, SessionType};
    use chrono::NaiveDate;

    fn header(callsign: &str) -> SuperHeader {
        SuperHeader {
            session_type: SessionType::GroupVoice,
            src_id: 2_161_005,
            dst_id: 216,
            src_call: Callsign::pad(callsign),
            dst_call: Callsign::empty(),
        }
    }

    fn started() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 7)
            .and_then(|d| d.and_hms_opt(9, 5, 1))
            .unwrap()
    }

    #[test]
    fn test_call_file_with_callsign() {
        let path = call_file(Path::new("/rec"), &header("HA2NON"), &started(), "mp3");
        assert_eq!(
            path,
            PathBuf::from("/rec/216/2024/03/07/090501-2161005-ha2non.mp3")
        );
    }

    #[test]
    fn test_call_file_without_callsign() {
        let path = call_file(Path::new("rec"), &header(""), &started(), "amb");
        assert_eq!(path, PathBuf::from("rec/216/2024/03/07/090501-2161005.amb"));
    }

    #[test]
    fn test_aggregate_file() {
        let h = header("HA2NON");
        let call = call_file(Path::new("/rec"), &h, &started(), "mp3");

        let aggregate = aggregate_file(&call, &h, &started(), "mp3");

        assert_eq!(aggregate, PathBuf::from("/rec/216/2024/03/07/20240307-216.mp3"));
    }
}
