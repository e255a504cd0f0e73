// SPDX-License-Identifier: MIT

//! Splitting a free-form requirements document into per-section chunks
//! (§4.5 "Chunk the input by headings/sections").

use foreman_core::RequirementChunk;

const FALLBACK_SECTION: &str = "general";

/// Split `text` on markdown-style headings (`#`, `##`, ...) into one chunk
/// per section. Text before the first heading (if any) becomes a chunk
/// named [`FALLBACK_SECTION`]. Blank documents yield no chunks.
pub fn chunk_document(text: &str) -> Vec<RequirementChunk> {
    let mut chunks = Vec::new();
    let mut current_section = FALLBACK_SECTION.to_string();
    let mut current_body = String::new();

    for line in text.lines() {
        if let Some(heading) = parse_heading(line) {
            flush(&mut chunks, &current_section, &current_body);
            current_section = heading;
            current_body.clear();
        } else {
            current_body.push_str(line);
            current_body.push('\n');
        }
    }
    flush(&mut chunks, &current_section, &current_body);

    chunks
}

fn flush(chunks: &mut Vec<RequirementChunk>, section: &str, body: &str) {
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        chunks.push(RequirementChunk { section: section.to_string(), text: trimmed.to_string() });
    }
}

fn parse_heading(line: &str) -> Option<String> {
    let trimmed = line.trim_start();
    let hashes = trimmed.chars().take_while(|c| *c == '#').count();
    if hashes == 0 || hashes > 6 {
        return None;
    }
    let rest = trimmed[hashes..].trim();
    if rest.is_empty() {
        return None;
    }
    Some(rest.to_string())
}

#[cfg(test)]
#[path = "chunk_tests.rs"]
mod tests;
