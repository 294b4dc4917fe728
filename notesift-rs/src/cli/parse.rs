//! Parse command: show how a query string is understood.

use crate::cli::args::ParseArgs;
use crate::cli::output::Output;
use crate::error::Result;
use crate::search::{FilterKind, ParsedQuery, parse_query};
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Serialize)]
pub struct ParseResponse {
    pub query: String,
    /// True when the query has nothing to search for.
    pub empty: bool,
    pub active_filters: BTreeSet<FilterKind>,
    pub parsed: ParsedQuery,
}

pub fn parse(query: &str, case_sensitive: bool) -> Result<ParseResponse> {
    let parsed = parse_query(query)?.case_sensitive(case_sensitive).finish();
    Ok(ParseResponse {
        query: query.to_string(),
        empty: parsed.is_empty(),
        active_filters: parsed.active_filters(),
        parsed,
    })
}

pub fn run(args: &ParseArgs, output: &Output) -> Result<()> {
    let response = parse(&args.query, args.case_sensitive)?;
    if response.empty {
        output.warn("query has no filters and no search text");
    }
    output.print(&response)
}
