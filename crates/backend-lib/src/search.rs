// ============================
// crates/backend-lib/src/search.rs
// ============================
//! Ranked substring/fuzzy matching for the task search box.
use taskboard_common::TaskRecord;

/// How well a candidate matches a query, weakest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Rank {
    /// Query characters appear in order
    Matches,
    /// Query is contained in the word initials
    Acronym,
    Contains,
    WordStartsWith,
    StartsWith,
    Equal,
    CaseSensitiveEqual,
}

/// Rank `candidate` against `query`, `None` when it does not match
pub fn rank(candidate: &str, query: &str) -> Option<Rank> {
    let query = query.trim();
    if query.is_empty() {
        return None;
    }
    if candidate == query {
        return Some(Rank::CaseSensitiveEqual);
    }

    let candidate = candidate.to_lowercase();
    let query = query.to_lowercase();
    if candidate == query {
        return Some(Rank::Equal);
    }
    if candidate.starts_with(&query) {
        return Some(Rank::StartsWith);
    }
    if candidate.contains(&format!(" {query}")) || candidate.contains(&format!("-{query}")) {
        return Some(Rank::WordStartsWith);
    }
    if candidate.contains(&query) {
        return Some(Rank::Contains);
    }
    // a lone character only counts as a plain substring
    if query.chars().count() == 1 {
        return None;
    }
    if acronym(&candidate).contains(&query) {
        return Some(Rank::Acronym);
    }
    if in_order(&candidate, &query) {
        return Some(Rank::Matches);
    }
    None
}

fn acronym(text: &str) -> String {
    text.split(|c: char| c.is_whitespace() || c == '-')
        .filter_map(|word| word.chars().next())
        .collect()
}

fn in_order(candidate: &str, query: &str) -> bool {
    let mut remaining = candidate.chars();
    query
        .chars()
        .all(|wanted| remaining.by_ref().any(|c| c == wanted))
}

/// Tasks whose name matches `query`, best match first. Ties keep input order.
pub fn filter_tasks(tasks: Vec<TaskRecord>, query: &str) -> Vec<TaskRecord> {
    let mut ranked: Vec<(Rank, TaskRecord)> = tasks
        .into_iter()
        .filter_map(|task| {
            let name = task.display_name().unwrap_or_default();
            rank(name, query).map(|r| (r, task))
        })
        .collect();
    ranked.sort_by(|a, b| b.0.cmp(&a.0));
    ranked.into_iter().map(|(_, task)| task).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use taskboard_common::TaskMutation;

    fn task(id: &str, name: Option<&str>) -> TaskRecord {
        TaskRecord::from_mutation(
            id.to_string(),
            format!("2024-01-01T00:00:0{id}.000Z"),
            TaskMutation {
                name: name.map(str::to_string),
                ..Default::default()
            },
        )
    }

    #[test]
    fn test_rank_levels() {
        assert_eq!(rank("Shruti", "Shruti"), Some(Rank::CaseSensitiveEqual));
        assert_eq!(rank("Shruti", "shruti"), Some(Rank::Equal));
        assert_eq!(rank("Shruti", "shr"), Some(Rank::StartsWith));
        assert_eq!(rank("alex-anderson", "and"), Some(Rank::WordStartsWith));
        assert_eq!(rank("buy milk", "milk"), Some(Rank::WordStartsWith));
        assert_eq!(rank("Shruti", "rut"), Some(Rank::Contains));
        assert_eq!(rank("alex anderson", "aa"), Some(Rank::Acronym));
        assert_eq!(rank("alex-anderson", "alxn"), Some(Rank::Matches));
        assert_eq!(rank("Shruti", "xyz"), None);
    }

    #[test]
    fn test_single_character_needs_substring() {
        assert_eq!(rank("Shruti", "h"), Some(Rank::Contains));
        assert_eq!(rank("Shruti", "z"), None);
    }

    #[test]
    fn test_blank_query_matches_nothing() {
        assert_eq!(rank("Shruti", "  "), None);
    }

    #[test]
    fn test_filter_orders_by_rank_then_input() {
        let tasks = vec![
            task("1", Some("write the alex report")),
            task("2", Some("alex-anderson")),
            task("3", Some("Alex")),
            task("4", None),
            task("5", Some("email alex")),
        ];
        let ids: Vec<String> = filter_tasks(tasks, "alex")
            .into_iter()
            .map(|t| t.id)
            .collect();
        assert_eq!(ids, vec!["3", "2", "1", "5"]);
    }
}
