// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use serde::Deserialize;

/// Numeric identity of one stage process in the pipeline.
pub type StageId = u32;

/// Where a transaction goes after a routing transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NextHop {
    /// Forward to this stage for its next processing step.
    Stage(StageId),
    /// The route is exhausted; return to the entry gateway.
    Terminal,
}

/// Newtype wrapper for the route table providing type safety.
///
/// A route is an ordered sequence of stage ids a transaction must visit;
/// `route_id` indexes into the table. The table is populated before any
/// stage starts and never changes afterwards, so it is shared read-only.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RouteTable(pub Vec<Vec<StageId>>);

impl RouteTable {
    /// Create an empty route table.
    pub fn new() -> Self {
        Self(Vec::new())
    }

    /// Number of routes in the table.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// True when the table has no routes.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Look up a route by id.
    pub fn route(&self, route_id: u32) -> Option<&[StageId]> {
        self.0.get(route_id as usize).map(Vec::as_slice)
    }

    /// The routing state transition: given a transaction's route and its
    /// hop count *after* incrementing, where does it go next?
    ///
    /// An unknown `route_id` resolves to [`NextHop::Terminal`] so a handler
    /// that scribbled a bad route id sends the transaction back to the
    /// gateway instead of wedging the stage.
    pub fn next_hop(&self, route_id: u32, hop_count: u32) -> NextHop {
        match self.route(route_id) {
            Some(route) => match route.get(hop_count as usize) {
                Some(stage) => NextHop::Stage(*stage),
                None => NextHop::Terminal,
            },
            None => NextHop::Terminal,
        }
    }
}

impl From<Vec<Vec<StageId>>> for RouteTable {
    fn from(routes: Vec<Vec<StageId>>) -> Self {
        Self(routes)
    }
}
