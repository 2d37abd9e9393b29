//! The closed set of diagnostic kinds
//!
//! Each kind has a stable string code (the first letter is the severity), a severity and a
//! message template with `{name}` placeholders that are filled from the diagnostic's
//! arguments.

use super::Severity;
use serde::{Serialize, Serializer};
use std::fmt;

macro_rules! diagnostic_kinds {
    ($( $variant:ident => ($code:literal, $severity:ident, $template:literal), )*) => {
        /// A diagnostic tag. See [`DiagnosticKind::code`] for the stable string form.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum DiagnosticKind {
            $( $variant, )*
        }

        impl DiagnosticKind {
            pub const ALL: &'static [DiagnosticKind] = &[ $( DiagnosticKind::$variant, )* ];

            pub fn code(self) -> &'static str {
                match self {
                    $( DiagnosticKind::$variant => $code, )*
                }
            }

            pub fn severity(self) -> Severity {
                match self {
                    $( DiagnosticKind::$variant => Severity::$severity, )*
                }
            }

            pub fn template(self) -> &'static str {
                match self {
                    $( DiagnosticKind::$variant => $template, )*
                }
            }
        }
    };
}

diagnostic_kinds! {
    // Line reader
    EncNotUtf8 => ("E_ENC_NOT_UTF8", Error, "not valid UTF-8 at byte {offset}, decoded as ISO-8859-1"),
    FileDosBareLf => ("W_FILE_DOS_BARELF", Warning, "bare LF line ending in a DOS (CRLF) file"),
    FileUnixCrlf => ("W_FILE_UNIX_CRLF", Warning, "CRLF line ending in a Unix (LF) file"),
    FileUnixNoLf => ("W_FILE_UNIX_NOLF", Warning, "missing line ending at end of file"),
    FileCtrlChar => ("W_FILE_CTRL_CHAR", Warning, "unexpected control character {char} at column {column}"),
    WshEol => ("W_WSH_EOL", Warning, "trailing whitespace at end of line"),
    WshBol => ("W_WSH_BOL", Warning, "unexpected leading whitespace"),

    // Grammar
    WshVarset => ("W_WSH_VARSET", Warning, "unexpected whitespace around '=' after {key}"),
    WshObjset => ("W_WSH_OBJSET", Warning, "expected exactly one space around '=>' after {key}"),
    PpExec => ("W_PP_EXEC", Warning, "#exec is discouraged, {command} is not inspected"),
    PpIncludeMissing => ("W_PP_INCLUDE_MISSING", Warning, "included file {path} not found"),
    PpUnknown => ("E_PP_UNKNOWN", Error, "unknown preprocessor directive #{directive}"),
    PpArgMissing => ("E_PP_ARG_MISSING", Error, "#{directive} without a file argument"),
    ConfUnparseable => ("E_CONF_UNPARSEABLE", Error, "unparseable line: {data}"),

    // Vertical whitespace
    WshBof => ("W_WSH_BOF", Warning, "empty line at beginning of file"),
    WshEof => ("W_WSH_EOF", Warning, "empty line at end of file"),
    WshVsplitMissing => ("W_WSH_VSPLIT_MISSING", Warning, "expected an empty line before context [{context}]"),
    WshVsplitExcess => ("W_WSH_VSPLIT_EXCESS", Warning, "more than one consecutive empty line"),

    // Generic configuration
    ConfCtxMissing => ("E_CONF_CTX_MISSING", Error, "{key} outside of any context"),
    ConfTemplateNotImpl => ("W_CONF_TEMPLATE_NOTIMPL", Warning, "context templates are not implemented: [{context}]({templates})"),

    // Dialplan
    DpCtxDupe => ("W_DP_CTX_DUPE", Warning, "context [{context}] is opened more than once"),
    DpGeneralDupe => ("W_DP_GENERAL_DUPE", Warning, "duplicate [general] context"),
    DpGlobalsDupe => ("W_DP_GLOBALS_DUPE", Warning, "duplicate [globals] context"),
    DpKeyInvalid => ("E_DP_KEY_INVALID", Error, "unexpected key {key} in dialplan context [{context}]"),
    DpExtenEquals => ("W_DP_EXTEN_EQUALS", Warning, "expected '=>' after {key}, found '='"),
    DpValueInvalid => ("E_DP_VALUE_INVALID", Error, "malformed {key} value: {value}"),
    DpPrioInvalid => ("E_DP_PRIO_INVALID", Error, "invalid priority {priority}"),
    DpPrioDupe => ("E_DP_PRIO_DUPE", Error, "duplicate priority {priority} for {pattern}"),
    DpPrioBadOrder => ("W_DP_PRIO_BADORDER", Warning, "priority {priority} for {pattern} does not follow {previous}"),
    DpLabelDupe => ("E_DP_LABEL_DUPE", Error, "duplicate label {label} for {pattern}"),
    DpPatInvalid => ("E_DP_PAT_INVALID", Error, "invalid pattern {pattern}"),
    PatNonCanonical => ("H_PAT_NON_CANONICAL", Hint, "pattern {pattern} is conventionally written as {canonical}"),

    // Variable substitution
    VarSubstrStart => ("E_VAR_SUBSTR_START", Error, "substring start {start} of {name} is not an integer"),
    VarSubstrLen => ("E_VAR_SUBSTR_LEN", Error, "invalid substring length {length} of {name}"),
    VarSubstrZero => ("W_VAR_SUBSTR_ZERO", Warning, "substring of {name} from 0 without a length has no effect"),
    FuncTailInvalid => ("E_FUNC_TAIL_INVALID", Error, "unexpected {tail} after function {function}"),
}

impl DiagnosticKind {
    /// Look up a kind by its stable code (e.g. `"E_DP_PRIO_DUPE"`).
    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|kind| kind.code() == code)
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl Serialize for DiagnosticKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_codes_are_unique() {
        let codes: HashSet<_> = DiagnosticKind::ALL.iter().map(|k| k.code()).collect();
        assert_eq!(codes.len(), DiagnosticKind::ALL.len());
    }

    #[test]
    fn test_code_prefix_matches_severity() {
        for kind in DiagnosticKind::ALL {
            assert!(
                kind.code().starts_with(kind.severity().letter()),
                "{} has severity {:?}",
                kind.code(),
                kind.severity()
            );
        }
    }

    #[test]
    fn test_from_code_round_trips() {
        for kind in DiagnosticKind::ALL {
            assert_eq!(DiagnosticKind::from_code(kind.code()), Some(*kind));
        }
        assert_eq!(DiagnosticKind::from_code("E_NOPE"), None);
    }
}
