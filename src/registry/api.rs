//! Public API for the Source Registry

pub use crate::registry::error::{RegistryError, RegistryResult};
pub use crate::registry::parse::{parse_payload, ParsedPayload};
pub use crate::registry::tools::{
    all as all_tools, spec as tool_spec, tools_for_kinds, FollowUp, LogDialect, PayloadShape,
    ToolSpec,
};
