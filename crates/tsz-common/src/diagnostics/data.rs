//! Diagnostic messages reported while assembling a program's file set.

use super::{DiagnosticCategory, DiagnosticMessage};

pub mod diagnostic_codes {
    /// `import "x"`, `require("x")` or `declare module "x"` that no file answers.
    pub const CANNOT_FIND_MODULE_OR_ITS_CORRESPONDING_TYPE_DECLARATIONS: u32 = 2307;
    /// `/// <reference types="x" />` or an entry in `types` that cannot be found.
    pub const CANNOT_FIND_TYPE_DEFINITION_FILE_FOR: u32 = 2688;
    /// `/// <reference lib="x" />` naming a lib that does not exist.
    pub const CANNOT_FIND_LIB_DEFINITION_FOR: u32 = 2726;
    pub const CANNOT_READ_FILE: u32 = 5083;
    /// A root file that is not on disk.
    pub const FILE_NOT_FOUND: u32 = 6053;
    /// A root file whose extension is not a supported source extension.
    pub const FILE_HAS_AN_UNSUPPORTED_EXTENSION: u32 = 6054;
    pub const FILE_IS_A_JAVASCRIPT_FILE_DID_YOU_MEAN_TO_ENABLE_THE_ALLOWJS_OPTION: u32 = 6504;
    pub const NO_INPUTS_WERE_FOUND_IN_CONFIG_FILE: u32 = 18003;
}

pub mod diagnostic_messages {
    pub const CANNOT_FIND_MODULE_OR_ITS_CORRESPONDING_TYPE_DECLARATIONS: &str =
        "Cannot find module '{0}' or its corresponding type declarations.";
    pub const CANNOT_FIND_TYPE_DEFINITION_FILE_FOR: &str =
        "Cannot find type definition file for '{0}'.";
    pub const CANNOT_FIND_LIB_DEFINITION_FOR: &str = "Cannot find lib definition for '{0}'.";
    pub const CANNOT_READ_FILE: &str = "Cannot read file '{0}'.";
    pub const FILE_NOT_FOUND: &str = "File '{0}' not found.";
    pub const FILE_HAS_AN_UNSUPPORTED_EXTENSION: &str =
        "File '{0}' has an unsupported extension. The only supported extensions are {1}.";
    pub const FILE_IS_A_JAVASCRIPT_FILE_DID_YOU_MEAN_TO_ENABLE_THE_ALLOWJS_OPTION: &str =
        "File '{0}' is a JavaScript file. Did you mean to enable the 'allowJs' option?";
    pub const NO_INPUTS_WERE_FOUND_IN_CONFIG_FILE: &str = "No inputs were found in config file '{0}'. Specified 'include' paths were '{1}' and 'exclude' paths were '{2}'.";
}

pub static DIAGNOSTIC_MESSAGES: &[DiagnosticMessage] = &[
    DiagnosticMessage {
        code: diagnostic_codes::CANNOT_FIND_MODULE_OR_ITS_CORRESPONDING_TYPE_DECLARATIONS,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::CANNOT_FIND_MODULE_OR_ITS_CORRESPONDING_TYPE_DECLARATIONS,
    },
    DiagnosticMessage {
        code: diagnostic_codes::CANNOT_FIND_TYPE_DEFINITION_FILE_FOR,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::CANNOT_FIND_TYPE_DEFINITION_FILE_FOR,
    },
    DiagnosticMessage {
        code: diagnostic_codes::CANNOT_FIND_LIB_DEFINITION_FOR,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::CANNOT_FIND_LIB_DEFINITION_FOR,
    },
    DiagnosticMessage {
        code: diagnostic_codes::CANNOT_READ_FILE,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::CANNOT_READ_FILE,
    },
    DiagnosticMessage {
        code: diagnostic_codes::FILE_NOT_FOUND,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::FILE_NOT_FOUND,
    },
    DiagnosticMessage {
        code: diagnostic_codes::FILE_HAS_AN_UNSUPPORTED_EXTENSION,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::FILE_HAS_AN_UNSUPPORTED_EXTENSION,
    },
    DiagnosticMessage {
        code: diagnostic_codes::FILE_IS_A_JAVASCRIPT_FILE_DID_YOU_MEAN_TO_ENABLE_THE_ALLOWJS_OPTION,
        category: DiagnosticCategory::Error,
        message:
            diagnostic_messages::FILE_IS_A_JAVASCRIPT_FILE_DID_YOU_MEAN_TO_ENABLE_THE_ALLOWJS_OPTION,
    },
    DiagnosticMessage {
        code: diagnostic_codes::NO_INPUTS_WERE_FOUND_IN_CONFIG_FILE,
        category: DiagnosticCategory::Error,
        message: diagnostic_messages::NO_INPUTS_WERE_FOUND_IN_CONFIG_FILE,
    },
];
