//! Deep-link launching.
//!
//! - [`link`]: parsing `scheme://host:port?mod=x`
//! - [`validate`]: per-title URL validators
//! - [`command`]: per-title command builders
//! - [`hooks`]: side effects run around process start
//! - [`pipeline`]: the hook / build / start sequence

pub mod command;
pub mod hooks;
pub mod link;
pub mod pipeline;
pub mod validate;

pub use command::{
    default_bf2_profiles_dir, default_profile_nick, CommandBuilder, RefractorV1Builder,
    RefractorV2Builder, UnrealBuilder,
};
pub use hooks::{HookArgs, HookHandler, KillProcessHook, RemoveFilesHook, SetDefaultProfileHook};
pub use link::{launch_only_link, parse_deep_link, query_param, server_address};
pub use pipeline::{HookFailure, LaunchPipeline, LaunchReport, LaunchRequest};
pub use validate::{Ipv4PortValidator, UrlValidator};
