//! Frequency statistics across a run.

use std::collections::HashMap;

use crate::pipeline::FileAnalysisResult;

/// Number of function names shown in reports.
pub const TOP_FUNCTION_NAMES: usize = 8;
/// Number of modules shown in reports.
pub const TOP_MODULES: usize = 10;

/// The `limit` most common items, most frequent first.
///
/// Items with equal counts keep the order in which they were first seen.
pub fn most_common<'a, I>(items: I, limit: usize) -> Vec<(String, usize)>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut counts: HashMap<&str, (usize, usize)> = HashMap::new();
    for (position, item) in items.into_iter().enumerate() {
        counts.entry(item).or_insert((0, position)).0 += 1;
    }

    let mut ranked: Vec<_> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1 .0.cmp(&a.1 .0).then(a.1 .1.cmp(&b.1 .1)));
    ranked
        .into_iter()
        .take(limit)
        .map(|(item, (count, _))| (item.to_string(), count))
        .collect()
}

pub fn top_function_names(files: &[FileAnalysisResult], limit: usize) -> Vec<(String, usize)> {
    most_common(
        files
            .iter()
            .flat_map(|f| f.functions.iter().map(|func| func.name.as_str())),
        limit,
    )
}

pub fn top_modules(modules: &[String], limit: usize) -> Vec<(String, usize)> {
    most_common(modules.iter().map(String::as_str), limit)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::FunctionAnalysisResult;

    fn function(name: &str) -> FunctionAnalysisResult {
        FunctionAnalysisResult {
            name: name.to_string(),
            args: Vec::new(),
            docstring: None,
            lineno: 1,
            length: Some(1),
            complexity: 3,
            explanation: None,
            optimization: None,
            error_check: None,
        }
    }

    #[test]
    fn test_most_common_orders_by_count_then_first_seen() {
        let items = ["b", "a", "c", "a", "c", "d"];
        let top = most_common(items, 10);
        assert_eq!(
            top,
            vec![
                ("a".to_string(), 2),
                ("c".to_string(), 2),
                ("b".to_string(), 1),
                ("d".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_most_common_limit() {
        let top = most_common(["x", "y", "z"], 2);
        assert_eq!(top.len(), 2);
        assert!(most_common(Vec::<&str>::new(), 5).is_empty());
    }

    #[test]
    fn test_top_function_names_across_files() {
        let files = vec![
            FileAnalysisResult {
                source_file: "a.py".to_string(),
                file_summary: None,
                functions: vec![function("__init__"), function("run")],
            },
            FileAnalysisResult {
                source_file: "b.py".to_string(),
                file_summary: None,
                functions: vec![function("__init__")],
            },
        ];
        let top = top_function_names(&files, TOP_FUNCTION_NAMES);
        assert_eq!(top[0], ("__init__".to_string(), 2));
        assert_eq!(top[1], ("run".to_string(), 1));
    }

    #[test]
    fn test_top_modules() {
        let modules: Vec<String> = ["os", "sys", "os", "json"].iter().map(|s| s.to_string()).collect();
        let top = top_modules(&modules, TOP_MODULES);
        assert_eq!(top[0], ("os".to_string(), 2));
        assert_eq!(top.len(), 3);
    }
}
