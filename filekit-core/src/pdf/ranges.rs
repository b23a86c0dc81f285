use crate::{FilekitError, Result};

/// Parse a page-range string into groups of 0-based page indices.
///
/// Tokens are comma separated and are either a 1-based page `N` or an
/// inclusive range `A-B`. Reversed bounds are swapped, bounds are clamped to
/// `1..=total_pages`, and tokens that do not parse or fall entirely outside
/// the document are skipped. Fails when no token survives.
///
/// ```
/// use filekit::pdf::parse_page_ranges;
///
/// let groups = parse_page_ranges("1-3, 5", 10).unwrap();
/// assert_eq!(groups, vec![vec![0, 1, 2], vec![4]]);
/// ```
pub fn parse_page_ranges(input: &str, total_pages: usize) -> Result<Vec<Vec<usize>>> {
    let groups: Vec<Vec<usize>> = input
        .split(',')
        .filter_map(|token| parse_token(token, total_pages))
        .collect();

    if groups.is_empty() {
        return Err(FilekitError::invalid("invalid page ranges"));
    }
    Ok(groups)
}

fn parse_token(token: &str, total_pages: usize) -> Option<Vec<usize>> {
    let token = token.trim();
    if token.is_empty() || total_pages == 0 {
        return None;
    }

    let (start, end) = match token.split_once('-') {
        Some((a, b)) => (a.trim().parse::<usize>().ok()?, b.trim().parse::<usize>().ok()?),
        None => {
            let page = token.parse::<usize>().ok()?;
            (page, page)
        }
    };
    let (low, high) = if start <= end { (start, end) } else { (end, start) };

    let low = low.max(1);
    let high = high.min(total_pages);
    if low > high {
        return None;
    }
    Some((low - 1..high).collect())
}
