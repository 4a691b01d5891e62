use autoalign::{render, Aligned, AutoalignError, EstimateConfig, Pair, Progress, Scoring, Seed};
use clap::{App, Arg};
#[macro_use]
extern crate log;

struct Console;

impl Progress for Console {
    fn average_cost(&self, average: f64) {
        info!("avg.unnorm.cost:{:.6}", average);
    }
}

fn main() -> Result<(), AutoalignError> {
    let matches = App::new("autoalign")
        .version("0.1")
        .about("Aligns paired symbol sequences with a cost function learned from the corpus itself.")
        .setting(clap::AppSettings::ArgRequiredElseHelp)
        .arg(
            Arg::with_name("verbose")
                .short("v")
                .multiple(true)
                .help("Debug mode"),
        )
        .arg(
            Arg::with_name("input")
                .long("input")
                .short("i")
                .value_name("CSV")
                .takes_value(true)
                .required(true)
                .help("Input corpus; one `LEFT, RIGHT` row per line, symbols white-space separated."),
        )
        .arg(
            Arg::with_name("machine")
                .long("machine")
                .short("m")
                .value_name("CSV")
                .takes_value(true)
                .help("Write machine-readable alignments (LEFT, RIGHT, SCORE) to this file."),
        )
        .arg(
            Arg::with_name("human")
                .long("human")
                .short("u")
                .value_name("TXT")
                .takes_value(true)
                .help("Write human-readable alignments to this file."),
        )
        .arg(
            Arg::with_name("seed")
                .long("seed")
                .takes_value(true)
                .default_value("uniform")
                .possible_values(&["uniform", "padding"])
                .help("Bootstrap estimator for the initial cost function."),
        )
        .arg(
            Arg::with_name("scoring")
                .long("scoring")
                .takes_value(true)
                .default_value("npmi")
                .possible_values(&["npmi", "pmi"])
                .help("Cost construction. npmi stays in [0,1]; pmi uses --pmi_k."),
        )
        .arg(
            Arg::with_name("pmi_k")
                .long("pmi_k")
                .takes_value(true)
                .default_value("2")
                .help("Joint-probability exponent for pmi scoring."),
        )
        .arg(
            Arg::with_name("max_iterations")
                .long("max_iterations")
                .takes_value(true)
                .help("Abort refinement after this many corpus passes."),
        )
        .arg(
            Arg::with_name("max_alignments")
                .long("max_alignments")
                .takes_value(true)
                .help("Cap on tied-optimal alignments enumerated per pair."),
        )
        .arg(
            Arg::with_name("threads")
                .long("threads")
                .short("t")
                .takes_value(true)
                .default_value("1")
                .help("Number of threads"),
        )
        .get_matches();
    let level = match matches.occurrences_of("verbose") {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level)).init();
    let threads: usize = matches
        .value_of("threads")
        .and_then(|x| x.parse().ok())
        .unwrap_or(1);
    if let Err(why) = rayon::ThreadPoolBuilder::new()
        .num_threads(threads)
        .build_global()
    {
        debug!("{:?}", why);
    }
    run(&matches)
}

fn run(matches: &clap::ArgMatches) -> Result<(), AutoalignError> {
    let input = matches.value_of("input").unwrap_or_default();
    let pairs = pairs_from(input)?;
    info!("read {} pairs from {}", pairs.len(), input);
    let config = config_from(matches);
    let aligned = autoalign::autoalign(&pairs, &config, &Console)?;
    let machine = matches.value_of("machine");
    let human = matches.value_of("human");
    if let Some(file) = machine {
        let mut rows = aligned.clone();
        render::by_left(&mut rows);
        text_to(file, &render::csv_text(&rows))?;
        info!("wrote {} alignments to {}", rows.len(), file);
    }
    if let Some(file) = human {
        let rows = by_score(aligned.clone());
        text_to(file, &render::pretty_text(&rows))?;
        info!("wrote {} alignments to {}", rows.len(), file);
    }
    if machine.is_none() && human.is_none() {
        let rows = by_score(aligned);
        print!("{}", render::pretty_text(&rows));
    }
    Ok(())
}

fn by_score(mut rows: Vec<Aligned>) -> Vec<Aligned> {
    render::by_score(&mut rows);
    rows
}

fn config_from(matches: &clap::ArgMatches) -> EstimateConfig {
    let seed = match matches.value_of("seed") {
        Some("padding") => Seed::Padding,
        _ => Seed::Uniform,
    };
    let k: f64 = matches
        .value_of("pmi_k")
        .and_then(|x| x.parse().ok())
        .unwrap_or(2.0);
    let scoring = match matches.value_of("scoring") {
        Some("pmi") => Scoring::Pmi { k },
        _ => Scoring::Npmi,
    };
    EstimateConfig {
        seed,
        scoring,
        max_iterations: matches
            .value_of("max_iterations")
            .and_then(|x| x.parse().ok()),
        max_alignments: matches
            .value_of("max_alignments")
            .and_then(|x| x.parse().ok()),
    }
}

/// Each non-empty line holds two comma-separated columns, each a
/// white-space separated sequence of symbols. Blank lines are skipped;
/// anything else malformed is an error naming the offending line.
fn pairs_from(path: &str) -> Result<Vec<Pair>, AutoalignError> {
    let text = std::fs::read_to_string(path)
        .map_err(|source| AutoalignError::io("reading the input corpus", source))?;
    let mut pairs = Vec::new();
    for (index, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let invalid = || AutoalignError::InvalidRow {
            line: index + 1,
            text: line.to_string(),
        };
        let mut columns = line.split(',');
        let (left, right) = match (columns.next(), columns.next(), columns.next()) {
            (Some(left), Some(right), None) => (left, right),
            _ => return Err(invalid()),
        };
        let left: Vec<_> = left.split_whitespace().map(str::to_string).collect();
        let right: Vec<_> = right.split_whitespace().map(str::to_string).collect();
        if left.is_empty() || right.is_empty() {
            return Err(invalid());
        }
        pairs.push(Pair::new(left, right));
    }
    Ok(pairs)
}

fn text_to(path: &str, text: &str) -> Result<(), AutoalignError> {
    std::fs::write(path, text).map_err(|source| AutoalignError::io("writing alignments", source))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn temp_corpus(name: &str, text: &str) -> std::path::PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!("autoalign-{}-{}.csv", name, std::process::id()));
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(text.as_bytes()).unwrap();
        path
    }

    #[test]
    fn parses_a_well_formed_corpus() {
        let path = temp_corpus("wellformed", "c a t, k a t\n\nc i t y, s i t i\n");
        let pairs = pairs_from(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].left, vec!["c", "a", "t"]);
        assert_eq!(pairs[1].right, vec!["s", "i", "t", "i"]);
    }

    #[test]
    fn rejects_rows_with_missing_columns() {
        let path = temp_corpus("nocomma", "c a t, k a t\nno comma here\n");
        let result = pairs_from(path.to_str().unwrap());
        std::fs::remove_file(&path).ok();
        match result {
            Err(AutoalignError::InvalidRow { line: 2, text }) => {
                assert_eq!(text, "no comma here");
            }
            other => panic!("expected an invalid-row error, got {:?}", other),
        }
    }

    #[test]
    fn rejects_rows_with_extra_columns() {
        let path = temp_corpus("extracol", "a, b, c\n");
        let result = pairs_from(path.to_str().unwrap());
        std::fs::remove_file(&path).ok();
        assert!(matches!(
            result,
            Err(AutoalignError::InvalidRow { line: 1, .. })
        ));
    }

    #[test]
    fn rejects_rows_with_an_empty_side() {
        let path = temp_corpus("emptyside", "a b c,   \n");
        let result = pairs_from(path.to_str().unwrap());
        std::fs::remove_file(&path).ok();
        assert!(matches!(
            result,
            Err(AutoalignError::InvalidRow { line: 1, .. })
        ));
    }

    #[test]
    fn missing_input_file_is_an_io_error() {
        let result = pairs_from("/nonexistent/corpus.csv");
        assert!(matches!(result, Err(AutoalignError::Io { .. })));
    }
}
