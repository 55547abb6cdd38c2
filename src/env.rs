//! Environment construction for the delegated toolchain

use crate::platform::PATH_LIST_SEPARATOR;
use std::collections::HashMap;
use std::ffi::{OsStr, OsString};
use std::path::Path;

/// Byte offset of the first `=` in a `KEY=VALUE` entry.
fn eq_index(kv: &OsStr) -> Option<usize> {
    kv.as_encoded_bytes().iter().position(|&b| b == b'=')
}

/// Keep the first position of each key, holding the last item seen for it.
/// Items whose key is `None` are kept as is.
fn dedup_by_key<T>(
    items: Vec<T>,
    case_insensitive: bool,
    key_of: impl Fn(&T) -> Option<Vec<u8>>,
) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    let mut seen: HashMap<Vec<u8>, usize> = HashMap::new();

    for item in items {
        let Some(mut key) = key_of(&item) else {
            out.push(item);
            continue;
        };
        if case_insensitive {
            key.make_ascii_lowercase();
        }

        match seen.get(&key) {
            Some(&idx) => out[idx] = item,
            None => {
                seen.insert(key, out.len());
                out.push(item);
            }
        }
    }

    out
}

/// Return `env` with duplicate keys removed in favor of later values.
///
/// Entries are `KEY=VALUE`. A later duplicate replaces the earlier entry in
/// place, so ordering follows first appearance. Entries without an `=`
/// after the first byte pass through untouched and are never considered
/// duplicates. With `case_insensitive`, keys compare ASCII-case-folded.
pub fn dedup_env(case_insensitive: bool, env: Vec<OsString>) -> Vec<OsString> {
    dedup_by_key(env, case_insensitive, |kv| match eq_index(kv) {
        Some(eq) if eq >= 1 => Some(kv.as_encoded_bytes()[..eq].to_vec()),
        _ => None,
    })
}

/// Environment for the delegated toolchain: the inherited variables plus
/// `GOROOT` pointing at `root` and `PATH` prefixed with `root/bin`.
///
/// Duplicates resolve as in [`dedup_env`]; keys that are empty or start
/// with `=` (Windows drive-cwd variables such as `=C:`) are kept as is.
pub fn delegate_env(
    root: &Path,
    inherited: impl IntoIterator<Item = (OsString, OsString)>,
    case_insensitive: bool,
) -> Vec<(OsString, OsString)> {
    let mut env: Vec<(OsString, OsString)> = inherited.into_iter().collect();

    let old_path = env
        .iter()
        .rev()
        .find(|(key, _)| {
            if case_insensitive {
                key.eq_ignore_ascii_case("PATH")
            } else {
                key == "PATH"
            }
        })
        .map(|(_, value)| value.clone());

    let mut new_path = root.join("bin").into_os_string();
    if let Some(p) = old_path.filter(|p| !p.is_empty()) {
        new_path.push(PATH_LIST_SEPARATOR);
        new_path.push(p);
    }

    env.push(("GOROOT".into(), root.as_os_str().to_os_string()));
    env.push(("PATH".into(), new_path));
    dedup_by_key(env, case_insensitive, |(key, _)| {
        let key = key.as_encoded_bytes();
        (!key.is_empty() && key[0] != b'=').then(|| key.to_vec())
    })
}
