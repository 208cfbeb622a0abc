//! Character alignment between an old and a new text.
//!
//! Produces a Levenshtein edit script where letters that differ only in case
//! count as kept. Edit reconciliation uses the script to carry the owning
//! word of every old character over to the new text.

/// One step of an edit script.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditOp {
    /// Old and new character match (ignoring case)
    Keep,
    /// Old character replaced by a new one
    Replace,
    /// Old character dropped
    Delete,
    /// New character inserted
    Insert,
}

fn same_ignoring_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Compute a minimal edit script turning `old` into `new`.
///
/// Ties are broken in favour of keeping, then replacing, then deleting, so
/// old characters are mapped onto new ones wherever the cost allows it.
///
/// # Examples
///
/// ```
/// use image_markup::text::{edit_script, EditOp};
///
/// let old: Vec<char> = "Hallo".chars().collect();
/// let new: Vec<char> = "hello!".chars().collect();
/// let script = edit_script(&old, &new);
/// assert_eq!(
///     script,
///     vec![EditOp::Keep, EditOp::Replace, EditOp::Keep, EditOp::Keep, EditOp::Keep, EditOp::Insert]
/// );
/// ```
pub fn edit_script(old: &[char], new: &[char]) -> Vec<EditOp> {
    let (n, m) = (old.len(), new.len());
    let width = m + 1;
    let mut dist = vec![0usize; (n + 1) * width];
    for i in 0..=n {
        dist[i * width] = i;
    }
    for (j, cell) in dist.iter_mut().enumerate().take(m + 1) {
        *cell = j;
    }
    for i in 1..=n {
        for j in 1..=m {
            let diagonal = dist[(i - 1) * width + j - 1] + usize::from(!same_ignoring_case(old[i - 1], new[j - 1]));
            let delete = dist[(i - 1) * width + j] + 1;
            let insert = dist[i * width + j - 1] + 1;
            dist[i * width + j] = diagonal.min(delete).min(insert);
        }
    }

    let mut ops = Vec::with_capacity(n.max(m));
    let (mut i, mut j) = (n, m);
    while i > 0 || j > 0 {
        let here = dist[i * width + j];
        if i > 0 && j > 0 {
            let same = same_ignoring_case(old[i - 1], new[j - 1]);
            let diagonal = dist[(i - 1) * width + j - 1];
            if same && here == diagonal {
                ops.push(EditOp::Keep);
                i -= 1;
                j -= 1;
                continue;
            }
            if !same && here == diagonal + 1 {
                ops.push(EditOp::Replace);
                i -= 1;
                j -= 1;
                continue;
            }
        }
        if i > 0 && here == dist[(i - 1) * width + j] + 1 {
            ops.push(EditOp::Delete);
            i -= 1;
        } else {
            ops.push(EditOp::Insert);
            j -= 1;
        }
    }
    ops.reverse();
    ops
}

/// For each new character, the index of the old character it was derived
/// from (kept or replaced), or `None` for insertions.
pub fn map_new_to_old(old: &[char], new: &[char]) -> Vec<Option<usize>> {
    let mut mapping = Vec::with_capacity(new.len());
    let mut i = 0;
    for op in edit_script(old, new) {
        match op {
            EditOp::Keep | EditOp::Replace => {
                mapping.push(Some(i));
                i += 1;
            },
            EditOp::Delete => i += 1,
            EditOp::Insert => mapping.push(None),
        }
    }
    mapping
}
