//! Common-subsequence search over fingerprinted line sequences.
//!
//! This is a bounded-cost divide-and-conquer shortest-edit-script
//! search. Key design decisions:
//!
//! 1. **Fingerprint comparisons**: the search loop compares 64-bit
//!    digests, never text. [`DiffOptions::verify_matches`] adds a full
//!    text comparison on digest-equal pairs for callers that cannot
//!    accept collision risk.
//!
//! 2. **Linear-space middle snake**: each split step runs a forward and
//!    a reverse diagonal search that meet in the middle, so only two
//!    reach vectors are ever allocated, by the top-level call. A split
//!    step seeds its own diagonal band and reads back only slots it
//!    wrote during that step, which is what lets sibling steps share
//!    the vectors without clearing them.
//!
//! 3. **Cost budget**: search effort is capped at roughly the square
//!    root of the combined input length (floor 256). When the cap is
//!    hit, the step splits at the best reach point found so far. The
//!    result is then a valid common subsequence that may not be
//!    maximal, which can cost diff quality but never correctness.
//!
//! 4. **Explicit worklist**: the divide-and-conquer runs on a LIFO task
//!    stack instead of call recursion. Equal-cost splits can otherwise
//!    nest O(n + m) deep and overflow the call stack.

use crate::line::Line;

/// Options controlling a diff computation.
#[derive(Clone, Copy, Debug, Default)]
pub struct DiffOptions {
    /// Also compare text when two fingerprints are equal, so a digest
    /// collision cannot join two different lines. Off by default; the
    /// fingerprint-only comparison is an accepted approximation.
    pub verify_matches: bool,
}

/// Compute a common subsequence of two fingerprinted line sequences
/// with default options.
///
/// The result is a valid subsequence of both inputs, in order. It is
/// usually the longest one, but the cost budget trades maximality for
/// bounded search time on adversarial inputs.
pub fn common_subsequence<'a>(first: &[Line<'a>], second: &[Line<'a>]) -> Vec<Line<'a>> {
    return common_subsequence_with(first, second, &DiffOptions::default());
}

/// Compute a common subsequence with explicit options.
pub fn common_subsequence_with<'a>(
    first: &[Line<'a>],
    second: &[Line<'a>],
    options: &DiffOptions,
) -> Vec<Line<'a>> {
    // The widest diagonal band of a full-range split touches slot
    // 2 * max in degenerate odd-length cases, hence the two spare slots.
    let max = (first.len() + second.len()) / 2 + 1;
    let mut search = Search {
        first,
        second,
        forward: vec![0; 2 * max + 2],
        reverse: vec![0; 2 * max + 2],
        budget: cost_budget(first.len() + second.len()),
        verify: options.verify_matches,
    };

    let mut result = Vec::new();
    let mut tasks = vec![Task::Split {
        first_start: 0,
        first_end: first.len() as isize,
        second_start: 0,
        second_end: second.len() as isize,
    }];
    while let Some(task) = tasks.pop() {
        match task {
            Task::Emit { start, end } => {
                result.extend_from_slice(&search.first[start as usize..end as usize]);
            }
            Task::Split {
                first_start,
                first_end,
                second_start,
                second_end,
            } => {
                search.split(
                    first_start,
                    first_end,
                    second_start,
                    second_end,
                    &mut tasks,
                    &mut result,
                );
            }
        }
    }
    return result;
}

/// Heuristic search budget: double for every right-shift-by-2 of the
/// combined length, floor 256. Grows on the order of the square root
/// of the input, which caps worst-case cost on huge inputs. Kept
/// verbatim so emitted scripts stay byte-stable across versions.
fn cost_budget(total: usize) -> isize {
    let mut budget: isize = 1;
    let mut length = total;
    while length != 0 {
        length >>= 2;
        budget <<= 1;
    }
    if budget < 256 {
        budget = 256;
    }
    return budget;
}

/// One unit of pending work. Tasks are pushed in reverse so popping
/// yields: left subrange, then the matched middle, then the right
/// subrange, preserving the output order of the recursive formulation.
enum Task {
    /// Search a subrange pair for its middle snake.
    Split {
        first_start: isize,
        first_end: isize,
        second_start: isize,
        second_end: isize,
    },
    /// Append `first[start..end]` to the result.
    Emit { start: isize, end: isize },
}

/// Search state for one top-level common-subsequence computation.
///
/// The reach vectors map a diagonal (offset by the step's center) to
/// the furthest `first`-index reached on that diagonal. They are owned
/// here and borrowed by every split step for the lifetime of the
/// computation.
struct Search<'s, 'a> {
    first: &'s [Line<'a>],
    second: &'s [Line<'a>],
    forward: Vec<isize>,
    reverse: Vec<isize>,
    budget: isize,
    verify: bool,
}

impl<'s, 'a> Search<'s, 'a> {
    fn lines_match(&self, i: isize, j: isize) -> bool {
        return self.first[i as usize].matches(&self.second[j as usize], self.verify);
    }

    /// Find the middle snake of one subrange pair, emit it, and queue
    /// the subranges on either side of it.
    ///
    /// Diagonals are indexed `first_index - second_index`. The forward
    /// search walks diagonals `delta_start ± cost`, the reverse search
    /// `delta_end ± cost`; a step touches no reach-vector slot outside
    /// those two bands.
    fn split(
        &mut self,
        first_start: isize,
        first_end: isize,
        second_start: isize,
        second_end: isize,
        tasks: &mut Vec<Task>,
        result: &mut Vec<Line<'a>>,
    ) {
        if first_end - first_start <= 0 || second_end - second_start <= 0 {
            return;
        }

        let delta_start = first_start - second_start;
        let delta_end = first_end - second_end;
        let delta = delta_end - delta_start;
        let mut max = (first_end - first_start + second_end - second_start) / 2 + 1;
        if max > self.budget {
            max = self.budget;
        }
        let center_forward = max - delta_start;
        let center_reverse = max - delta_end;
        self.forward[(max + 1) as usize] = first_start;
        self.reverse[(max + 1) as usize] = first_end + 1;

        // The middle snake as ((x, y), (u, v)): it starts at (x, y)
        // and its matched run ends at (u, v).
        let mut snake: Option<((isize, isize), (isize, isize))> = None;
        let mut cost = 0;
        while cost <= max && snake.is_none() {
            // Forward step: extend every diagonal in the band by one
            // edit, then slide down runs of matching lines.
            let mut diagonal = delta_start - cost;
            while diagonal <= delta_start + cost && snake.is_none() {
                let x = if diagonal == delta_start - cost
                    || (diagonal != delta_start + cost
                        && self.forward[(center_forward + diagonal - 1) as usize]
                            < self.forward[(center_forward + diagonal + 1) as usize])
                {
                    self.forward[(center_forward + diagonal + 1) as usize]
                } else {
                    self.forward[(center_forward + diagonal - 1) as usize] + 1
                };
                let y = x - diagonal;
                let mut u = x;
                let mut v = y;
                while u < first_end && v < second_end && self.lines_match(u, v) {
                    u += 1;
                    v += 1;
                }
                self.forward[(center_forward + diagonal) as usize] = u;

                // With odd delta, only the forward search can first
                // overlap the reverse reach of the previous round.
                if delta % 2 != 0
                    && diagonal >= delta_end - (cost - 1)
                    && diagonal <= delta_end + (cost - 1)
                    && self.forward[(center_forward + diagonal) as usize]
                        >= self.reverse[(center_reverse + diagonal) as usize]
                {
                    snake = Some(((x, y), (u, v)));
                }
                diagonal += 2;
            }

            // Reverse step, mirrored from the range ends.
            let mut diagonal = delta_end - cost;
            while diagonal <= delta_end + cost && snake.is_none() {
                let u = if diagonal == delta_end - cost
                    || (diagonal != delta_end + cost
                        && self.reverse[(center_reverse + diagonal - 1) as usize]
                            >= self.reverse[(center_reverse + diagonal + 1) as usize])
                {
                    self.reverse[(center_reverse + diagonal + 1) as usize] - 1
                } else {
                    self.reverse[(center_reverse + diagonal - 1) as usize]
                };
                let v = u - diagonal;
                let mut x = u;
                let mut y = v;
                while x > first_start && y > second_start && self.lines_match(x - 1, y - 1) {
                    x -= 1;
                    y -= 1;
                }
                self.reverse[(center_reverse + diagonal) as usize] = x;

                if delta % 2 == 0
                    && diagonal >= delta_start - cost
                    && diagonal <= delta_start + cost
                    && self.forward[(center_forward + diagonal) as usize]
                        >= self.reverse[(center_reverse + diagonal) as usize]
                {
                    snake = Some(((x, y), (u, v)));
                }
                diagonal += 2;
            }
            cost += 1;
        }
        cost -= 1;

        let ((x, y), (u, v)) = match snake {
            Some(snake) => snake,
            None => {
                // Budget exhausted. Split at whichever search covered
                // more ground from its own boundary; the subsequence
                // stays valid but may miss matches. Forward wins ties
                // so repeated runs stay byte-identical.
                log::debug!(
                    "edit cost exceeded budget {max} on ranges {first_start}..{first_end} / {second_start}..{second_end}; splitting at best reach",
                );
                let mut forward_best_x = 0;
                let mut forward_best_y = 0;
                let mut diagonal = delta_start - cost;
                while diagonal <= delta_start + cost {
                    let best_x = self.forward[(center_forward + diagonal) as usize];
                    let best_y = best_x - diagonal;
                    if best_x + best_y > forward_best_x + forward_best_y {
                        forward_best_x = best_x;
                        forward_best_y = best_y;
                    }
                    diagonal += 2;
                }

                let mut reverse_best_x = first_end;
                let mut reverse_best_y = second_end;
                let mut diagonal = delta_end - cost;
                while diagonal <= delta_end + cost {
                    let best_x = self.reverse[(center_reverse + diagonal) as usize];
                    let best_y = best_x - diagonal;
                    if best_x + best_y < reverse_best_x + reverse_best_y {
                        reverse_best_x = best_x;
                        reverse_best_y = best_y;
                    }
                    diagonal += 2;
                }

                let split = if (forward_best_x - first_start) + (forward_best_y - second_start)
                    >= (first_end - reverse_best_x) + (second_end - reverse_best_y)
                {
                    (forward_best_x, forward_best_y)
                } else {
                    (reverse_best_x, reverse_best_y)
                };
                (split, split)
            }
        };

        if cost > 1 || (delta % 2 == 0 && cost == 1) {
            tasks.push(Task::Split {
                first_start: u,
                first_end,
                second_start: v,
                second_end,
            });
            tasks.push(Task::Emit { start: x, end: u });
            tasks.push(Task::Split {
                first_start,
                first_end: x,
                second_start,
                second_end: y,
            });
        } else if first_end - first_start < second_end - second_start {
            // At most one edit separates the ranges, so the shorter
            // range is itself the common subsequence.
            for i in first_start..first_end {
                result.push(self.first[i as usize]);
            }
        } else {
            for i in second_start..second_end {
                result.push(self.second[i as usize]);
            }
        }
    }
}
