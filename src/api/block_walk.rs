// src/api/block_walk.rs
//! Depth-first walk of a record's content blocks, collecting plain text.
//!
//! The walk keeps an explicit stack of frames, one per block whose
//! children are being listed, so the nesting depth is bounded by
//! `max_depth` rather than by the call stack. Text is accumulated in a
//! budget owned by the walk; once the budget is spent no further pages are
//! requested.

use super::types::PaginatedResponse;
use crate::error::AppError;
use crate::model::BlockNode;
use serde_json::Value;
use std::collections::VecDeque;

/// Accumulated chunks and the length of their `"\n"` join, in characters.
#[derive(Debug)]
struct TextBudget {
    chunks: Vec<String>,
    joined_chars: usize,
    max_chars: usize,
}

impl TextBudget {
    fn new(max_chars: usize) -> Self {
        Self {
            chunks: Vec::new(),
            joined_chars: 0,
            max_chars,
        }
    }

    fn push(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        if !self.chunks.is_empty() {
            self.joined_chars += 1;
        }
        self.joined_chars += text.chars().count();
        self.chunks.push(text.to_string());
    }

    fn is_spent(&self) -> bool {
        self.joined_chars >= self.max_chars
    }

    fn finish(self) -> String {
        self.chunks
            .join("\n")
            .chars()
            .take(self.max_chars)
            .collect()
    }
}

/// One block whose children are being listed.
struct WalkFrame {
    block_id: String,
    depth: usize,
    pending: VecDeque<BlockNode>,
    cursor: Option<String>,
    more_pages: bool,
}

impl WalkFrame {
    fn new(block_id: String, depth: usize) -> Self {
        Self {
            block_id,
            depth,
            pending: VecDeque::new(),
            cursor: None,
            more_pages: true,
        }
    }
}

/// Collects the plain text under `root_id`.
///
/// `list_children(block_id, cursor)` returns one page of a block's
/// children. The root's children are at depth 0; a block's children are
/// listed only while their depth stays within `max_depth`. The result is
/// the `"\n"` join of every non-empty block text in document order,
/// truncated to `max_chars` characters.
pub async fn collect_plain_text<F, Fut>(
    root_id: &str,
    max_chars: usize,
    max_depth: usize,
    mut list_children: F,
) -> Result<String, AppError>
where
    F: FnMut(String, Option<String>) -> Fut,
    Fut: std::future::Future<Output = Result<PaginatedResponse<Value>, AppError>>,
{
    let mut budget = TextBudget::new(max_chars);
    let mut stack = vec![WalkFrame::new(root_id.to_string(), 0)];

    while let Some(frame) = stack.last_mut() {
        if budget.is_spent() {
            break;
        }

        if let Some(node) = frame.pending.pop_front() {
            budget.push(node.text.as_str());
            let child_depth = frame.depth + 1;
            if node.has_children && child_depth <= max_depth && !node.id.is_empty() {
                stack.push(WalkFrame::new(node.id, child_depth));
            }
            continue;
        }

        if !frame.more_pages {
            stack.pop();
            continue;
        }

        let page = list_children(frame.block_id.clone(), frame.cursor.take()).await?;
        frame
            .pending
            .extend(page.results.iter().map(BlockNode::from_json));
        frame.more_pages = page.has_more && page.next_cursor.is_some();
        frame.cursor = page.next_cursor;
    }

    Ok(budget.finish())
}
