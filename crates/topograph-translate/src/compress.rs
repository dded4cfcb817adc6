//! Hostname range folding.
//!
//! `node0482`, `node0483`, `node0484` fold into `node0[482-484]`, the list
//! syntax schedulers accept for node and switch names.

use std::collections::BTreeMap;

/// Split a name into a prefix and its numeric suffix.
///
/// The suffix is the trailing run of decimal digits without its leading
/// zeros; those zeros stay in the prefix so that `prefix + suffix` always
/// reconstructs the name.
pub fn split(name: &str) -> (&str, &str) {
    let bytes = name.as_bytes();
    let mut start = bytes.len();
    while start > 0 && bytes[start - 1].is_ascii_digit() {
        start -= 1;
    }
    while start < bytes.len() && bytes[start] == b'0' {
        start += 1;
    }
    name.split_at(start)
}

#[derive(Default)]
struct Group {
    /// The prefix itself was one of the names.
    bare: bool,
    values: Vec<u64>,
    /// Names whose suffix does not fit in a u64.
    verbatim: Vec<String>,
}

/// Fold names into prefix ranges.
///
/// Names sharing a prefix with consecutive suffixes collapse into
/// `prefix[first-last]`; isolated values stay as `prefix<n>`. Groups are
/// emitted in prefix order and, within a group, in ascending numeric order.
/// Duplicates collapse.
pub fn compress<I, S>(names: I) -> Vec<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut groups: BTreeMap<String, Group> = BTreeMap::new();
    for name in names {
        let name = name.as_ref();
        let (prefix, suffix) = split(name);
        let group = groups.entry(prefix.to_string()).or_default();
        if suffix.is_empty() {
            group.bare = true;
        } else {
            match suffix.parse::<u64>() {
                Ok(n) => group.values.push(n),
                Err(_) => group.verbatim.push(name.to_string()),
            }
        }
    }

    let mut out = Vec::new();
    for (prefix, mut group) in groups {
        if group.bare {
            out.push(prefix.clone());
        }

        group.values.sort_unstable();
        group.values.dedup();
        let mut values = group.values.into_iter().peekable();
        while let Some(first) = values.next() {
            let mut last = first;
            while let Some(next) = values.next_if(|&n| Some(n) == last.checked_add(1)) {
                last = next;
            }
            if first == last {
                out.push(format!("{prefix}{first}"));
            } else {
                out.push(format!("{prefix}[{first}-{last}]"));
            }
        }

        group.verbatim.sort();
        group.verbatim.dedup();
        out.extend(group.verbatim);
    }
    out
}

/// Expand one token produced by [`compress`] back into names.
///
/// Names are produced lazily, so a wide range costs nothing until consumed.
pub fn expand(token: &str) -> impl Iterator<Item = String> + '_ {
    let range = token
        .strip_suffix(']')
        .and_then(|rest| rest.rsplit_once('['))
        .and_then(|(prefix, range)| {
            let (first, last) = range.split_once('-')?;
            Some((prefix, first.parse::<u64>().ok()?, last.parse::<u64>().ok()?))
        })
        .filter(|(_, first, last)| first <= last);

    let plain = range.is_none().then(|| token.to_string());
    let names = range
        .into_iter()
        .flat_map(|(prefix, first, last)| (first..=last).map(move |n| format!("{prefix}{n}")));
    plain.into_iter().chain(names)
}
