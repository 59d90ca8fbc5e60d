//! Administrative commands

use std::path::PathBuf;

use anyhow::Context as _;
use clap::{Args, ValueEnum};
use responder_core::{CoreError, NewResponder, ResponderFilter};
use serde_json::json;

use super::{print_json, Context};

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum FilterArg {
    All,
    Available,
    Person,
}

impl From<FilterArg> for ResponderFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => ResponderFilter::All,
            FilterArg::Available => ResponderFilter::Available,
            FilterArg::Person => ResponderFilter::Person,
        }
    }
}

#[derive(Debug, Args)]
pub struct ListArgs {
    #[arg(long, value_enum, default_value = "all")]
    pub filter: FilterArg,

    #[arg(long)]
    pub limit: Option<usize>,

    #[arg(long, default_value_t = 0)]
    pub offset: usize,
}

#[derive(Debug, Args)]
pub struct CreateArgs {
    /// JSON array of responders without ids
    #[arg(long)]
    pub file: PathBuf,
}

pub fn list(ctx: &Context, args: ListArgs) -> anyhow::Result<()> {
    let responders = ctx
        .service()
        .list(args.filter.into(), args.limit, args.offset)
        .map_err(CoreError::from)?;
    print_json(&responders)
}

pub fn stats(ctx: &Context) -> anyhow::Result<()> {
    let stats = ctx.service().stats().map_err(CoreError::from)?;
    print_json(&stats)
}

pub fn create(ctx: &Context, args: CreateArgs) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("failed to read {}", args.file.display()))?;
    let responders: Vec<NewResponder> = serde_json::from_str(&raw)
        .with_context(|| format!("{} is not a JSON array of responders", args.file.display()))?;

    let ids = ctx
        .service()
        .create_responders(&responders)
        .map_err(CoreError::from)?;
    print_json(&json!({ "created": ids }))
}

pub fn reset(ctx: &Context) -> anyhow::Result<()> {
    ctx.service().reset().map_err(CoreError::from)?;
    print_json(&json!({ "reset": true }))
}

pub fn clear(ctx: &Context) -> anyhow::Result<()> {
    let removed = ctx.service().clear().map_err(CoreError::from)?;
    print_json(&json!({ "deleted": removed }))
}
