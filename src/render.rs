//! Text renderers for scored alignments, one machine-readable and one for
//! human eyes, plus the orderings the command line offers.
use crate::Aligned;

/// One CSV row per alignment: the aligned left sequence, the aligned right
/// sequence and the score, comma-separated, symbols joined with spaces.
pub fn csv_text(rows: &[Aligned]) -> String {
    let mut text = String::new();
    for row in rows {
        text.push_str(&format!(
            "{}, {}, {}\n",
            row.alignment.left.join(" "),
            row.alignment.right.join(" "),
            row.score
        ));
    }
    text
}

/// Two lines per alignment, the right sequence under the left one with
/// each column padded so paired symbols line up, preceded by the score.
/// Commas inside symbols become colons so the output stays greppable.
pub fn pretty_text(rows: &[Aligned]) -> String {
    let mut text = String::new();
    for row in rows {
        let left = &row.alignment.left;
        let right = &row.alignment.right;
        let columns: Vec<String> = left
            .iter()
            .zip(right)
            .map(|(l, r)| pad(l, r))
            .collect();
        text.push_str(&format!("{:.2} {}\n", row.score, columns.join(" ")));
        let columns: Vec<String> = right
            .iter()
            .zip(left)
            .map(|(r, l)| pad(r, l))
            .collect();
        text.push_str(&format!("     {}\n\n", columns.join(" ")));
    }
    text
}

// Pads `symbol` with trailing spaces to the display width of its partner.
fn pad(symbol: &str, partner: &str) -> String {
    let width = symbol.chars().count().max(partner.chars().count());
    let mut out: String = symbol.replace(',', ":");
    for _ in symbol.chars().count()..width {
        out.push(' ');
    }
    out
}

/// Sorts best-scoring alignments first.
pub fn by_score(rows: &mut [Aligned]) {
    rows.sort_by(|a, b| b.score.total_cmp(&a.score));
}

/// Sorts lexically by the aligned left sequence.
pub fn by_left(rows: &mut [Aligned]) {
    rows.sort_by(|a, b| a.alignment.left.cmp(&b.alignment.left));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edit::Alignment;

    fn sym(text: &str) -> Vec<String> {
        text.split_whitespace().map(str::to_string).collect()
    }

    fn aligned(left: &str, right: &str, score: f64) -> Aligned {
        Aligned {
            alignment: Alignment {
                left: sym(left),
                right: sym(right),
            },
            score,
        }
    }

    #[test]
    fn csv_rows_carry_sequences_and_score() {
        let rows = vec![aligned("k a t", "K A T", 0.875), aligned("a", "A", 1.0)];
        let text = csv_text(&rows);
        assert_eq!(text, "k a t, K A T, 0.875\na, A, 1\n");
    }

    #[test]
    fn pretty_columns_line_up() {
        let rows = vec![aligned("th e", "TH ·", 0.5)];
        let text = pretty_text(&rows);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "0.50 th e");
        assert_eq!(lines[1], "     TH ·");
        assert_eq!(lines[2], "");
    }

    #[test]
    fn pretty_pads_the_narrow_side() {
        let rows = vec![aligned("a xyz", "ABC z", 0.25)];
        let text = pretty_text(&rows);
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "0.25 a   xyz");
        assert_eq!(lines[1], "     ABC z  ");
    }

    #[test]
    fn score_ordering_is_descending() {
        let mut rows = vec![
            aligned("a", "A", 0.2),
            aligned("b", "B", 0.9),
            aligned("c", "C", 0.5),
        ];
        by_score(&mut rows);
        let scores: Vec<f64> = rows.iter().map(|row| row.score).collect();
        assert_eq!(scores, vec![0.9, 0.5, 0.2]);
    }

    #[test]
    fn left_ordering_is_lexical() {
        let mut rows = vec![
            aligned("c a t", "C A T", 0.1),
            aligned("a n t", "A N T", 0.2),
            aligned("b a t", "B A T", 0.3),
        ];
        by_left(&mut rows);
        let firsts: Vec<&str> = rows
            .iter()
            .map(|row| row.alignment.left[0].as_str())
            .collect();
        assert_eq!(firsts, vec!["a", "b", "c"]);
    }
}
