//! Fuzzy resolution of a free-text query to a single task.
//!
//! A task is a candidate only when every query character appears in its
//! title, in order. Candidates whose title contains the query as a
//! contiguous substring always rank above scattered matches. Within a
//! tier, earlier matches and shorter titles win. Ties keep file order, so
//! the first task in the file is returned.

use tracing::debug;

use crate::task::Task;

/// Position and length past which the proximity bonus stops growing.
const PROXIMITY_CAP: usize = 255;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchOptions {
    pub case_sensitive: bool,
}

/// Ordered score; any `Contiguous` outranks any `Scattered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchScore {
    Scattered(u32),
    Contiguous(u32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Match<'a> {
    pub task: &'a Task,
    pub score: MatchScore,
}

fn normalize(text: &str, options: MatchOptions) -> Vec<char> {
    if options.case_sensitive {
        text.chars().collect()
    } else {
        text.chars().flat_map(char::to_lowercase).collect()
    }
}

fn proximity_bonus(start: usize, title_len: usize) -> u32 {
    let cap = PROXIMITY_CAP as u32;
    let start_penalty = start.min(PROXIMITY_CAP) as u32 * 8;
    let length_penalty = title_len.min(PROXIMITY_CAP) as u32;
    cap * 9 - start_penalty - length_penalty
}

fn find_contiguous(query: &[char], title: &[char]) -> Option<usize> {
    if query.is_empty() {
        return Some(0);
    }
    title.windows(query.len()).position(|window| window == query)
}

/// Leftmost greedy subsequence positions.
fn find_subsequence(query: &[char], title: &[char]) -> Option<Vec<usize>> {
    let mut positions = Vec::with_capacity(query.len());
    let mut cursor = 0;
    for ch in query {
        let offset = title[cursor..].iter().position(|candidate| candidate == ch)?;
        positions.push(cursor + offset);
        cursor += offset + 1;
    }
    Some(positions)
}

/// Each matched character adds a run value that doubles (plus one) while
/// matches stay adjacent and resets to one after a gap.
fn run_score(positions: &[usize]) -> u32 {
    let mut total: u32 = 0;
    let mut run: u32 = 0;
    let mut previous: Option<usize> = None;
    for &pos in positions {
        run = match previous {
            Some(prev) if pos == prev + 1 => run.saturating_mul(2).saturating_add(1),
            _ => 1,
        };
        total = total.saturating_add(run);
        previous = Some(pos);
    }
    total
}

pub fn score(query: &str, title: &str, options: MatchOptions) -> Option<MatchScore> {
    let query = normalize(query, options);
    let title = normalize(title, options);

    if let Some(start) = find_contiguous(&query, &title) {
        return Some(MatchScore::Contiguous(proximity_bonus(start, title.len())));
    }

    let positions = find_subsequence(&query, &title)?;
    let start = positions.first().copied().unwrap_or(0);
    Some(MatchScore::Scattered(
        run_score(&positions).saturating_add(proximity_bonus(start, title.len())),
    ))
}

/// All matching tasks, best first; equal scores keep file order.
pub fn rank<'a>(query: &str, tasks: &'a [Task], options: MatchOptions) -> Vec<Match<'a>> {
    let mut matches: Vec<Match<'a>> = tasks
        .iter()
        .filter_map(|task| {
            score(query, &task.title, options).map(|score| Match { task, score })
        })
        .collect();
    matches.sort_by(|a, b| b.score.cmp(&a.score));
    matches
}

/// Best match for `query`, or `None` when no title contains it as a
/// subsequence. Ties resolve to the earliest task.
pub fn resolve<'a>(query: &str, tasks: &'a [Task], options: MatchOptions) -> Option<Match<'a>> {
    let ranked = rank(query, tasks, options);
    match ranked.as_slice() {
        [] => debug!(query, candidates = tasks.len(), "no task matched"),
        [best, rest @ ..] => debug!(
            query,
            line = best.task.line_index,
            score = ?best.score,
            runner_up = ?rest.first().map(|next| (next.task.line_index, next.score)),
            "resolved task"
        ),
    }
    ranked.into_iter().next()
}
