//! Recording command lines
//!
//! Commands are configured as plain strings with `$SRCCALL`, `$SRCID`,
//! `$DSTCALL` and `$DSTID` placeholders filled in from the call's super
//! header.

use crate::protocol::rewind::SuperHeader;

/// One configured recording stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordingCommand {
    /// Command line template
    pub command_line: String,
    /// Log the stage's stderr
    pub show_stderr: bool,
}

/// A command ready to spawn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpandedCommand {
    /// Program to run
    pub program: String,
    /// Arguments
    pub args: Vec<String>,
    /// Log the stage's stderr
    pub show_stderr: bool,
}

impl RecordingCommand {
    /// Create a stage
    pub fn new(command_line: impl Into<String>, show_stderr: bool) -> Self {
        Self {
            command_line: command_line.into(),
            show_stderr,
        }
    }

    /// Substitute placeholders and split into program and arguments
    ///
    /// Returns `None` for a blank command line.
    #[must_use]
    pub fn expand(&self, header: &SuperHeader) -> Option<ExpandedCommand> {
        let line = substitute(&self.command_line, header);
        let mut words = line.split_whitespace().map(str::to_string);
        let program = words.next()?;
        Some(ExpandedCommand {
            program,
            args: words.collect(),
            show_stderr: self.show_stderr,
        })
    }
}

/// Fill in call placeholders
#[must_use]
pub fn substitute(template: &str, header: &SuperHeader) -> String {
    template
        .replace("$SRCCALL", &header.src_call.trimmed())
        .replace("$SRCID", &header.src_id.to_string())
        .replace("$DSTCALL", &header.dst_call.trimmed())
        .replace("$DSTID", &header.dst_id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::rewind::{Callsign, SessionType};

    fn header() -> SuperHeader {
        SuperHeader {
            session_type: SessionType::GroupVoice,
            src_id: 2_161_005,
            dst_id: 216,
            src_call: Callsign::pad("HA2NON"),
            dst_call: Callsign::pad("TG216"),
        }
    }

    #[test]
    fn test_substitute_all_placeholders() {
        let line = substitute("tag --artist $SRCCALL/$SRCID --album $DSTCALL-$DSTID", &header());
        assert_eq!(line, "tag --artist HA2NON/2161005 --album TG216-216");
    }

    #[test]
    fn test_expand_splits_words() {
        let cmd = RecordingCommand::new("lame  -r -s 8 --bitwidth 16 - -  ", true);

        let expanded = cmd.expand(&header()).unwrap();

        assert_eq!(expanded.program, "lame");
        assert_eq!(expanded.args, ["-r", "-s", "8", "--bitwidth", "16", "-", "-"]);
        assert!(expanded.show_stderr);
    }

    #[test]
    fn test_expand_blank_line() {
        assert!(RecordingCommand::new("   ", false).expand(&header()).is_none());
    }

    #[test]
    fn test_empty_callsign_substitutes_nothing() {
        let mut h = header();
        h.src_call = Callsign::empty();
        assert_eq!(substitute("x$SRCCALL-y", &h), "x-y");
    }
}
