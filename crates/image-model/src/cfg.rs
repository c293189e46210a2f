// Copyright (c) The Mockweaver Contributors
// SPDX-License-Identifier: Apache-2.0

//! Read-only control-flow-graph view over a function body: deterministic
//! reverse-postorder block traversal and reachability queries. Built once per
//! scanned function and dropped when the caller's scope ends.

use std::collections::BTreeMap;

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::DfsPostOrder;

use crate::body::{BlockId, FunctionBody};

pub struct ControlFlowGraph {
    rpo: Vec<BlockId>,
    entry: BlockId,
    exit: BlockId,
}

impl ControlFlowGraph {
    pub fn new(body: &FunctionBody) -> Self {
        let mut graph: DiGraph<BlockId, ()> = DiGraph::new();
        let mut nodes: BTreeMap<BlockId, NodeIndex> = BTreeMap::new();
        for b in body.block_ids() {
            nodes.insert(b, graph.add_node(b));
        }
        for b in body.block_ids() {
            for s in &body.block(b).succs {
                graph.add_edge(nodes[&b], nodes[s], ());
            }
        }

        let mut order = Vec::new();
        let mut dfs = DfsPostOrder::new(&graph, nodes[&body.entry()]);
        while let Some(nx) = dfs.next(&graph) {
            order.push(graph[nx]);
        }
        order.reverse();

        ControlFlowGraph {
            rpo: order,
            entry: body.entry(),
            exit: body.exit(),
        }
    }

    pub fn entry_block(&self) -> BlockId {
        self.entry
    }

    pub fn exit_block(&self) -> BlockId {
        self.exit
    }

    /// Blocks reachable from the entry, in reverse postorder.
    pub fn reverse_postorder(&self) -> impl Iterator<Item = BlockId> + '_ {
        self.rpo.iter().copied()
    }

    pub fn is_reachable(&self, block: BlockId) -> bool {
        self.rpo.contains(&block)
    }
}
