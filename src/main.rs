use std::fs::File;
use std::io::{BufWriter, Write};
use std::time::Instant;
use wordclique::prelude::*;
use wordclique::words::ALPHABET_LEN;

fn main() {
    let mut word_len = 5usize;
    let mut group_size: Option<usize> = None;
    let mut repr = MatrixRepr::Packed;
    let mut dedup_anagrams = true;
    let mut reorder = true;
    let mut threads = 0usize;
    let mut output: Option<String> = None;
    let mut verify = false;
    let mut words_file: Option<String> = None;

    let args: Vec<String> = std::env::args().collect();
    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--length" => {
                let v = args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
                word_len = v.parse().unwrap_or_else(|_| usage_and_exit(2));
                i += 2;
            }
            "--group-size" => {
                let v = args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
                group_size = Some(v.parse().unwrap_or_else(|_| usage_and_exit(2)));
                i += 2;
            }
            "--packed" => {
                repr = MatrixRepr::Packed;
                i += 1;
            }
            "--expanded" => {
                repr = MatrixRepr::Expanded;
                i += 1;
            }
            "--keep-anagrams" => {
                dedup_anagrams = false;
                i += 1;
            }
            "--no-reorder" => {
                reorder = false;
                i += 1;
            }
            "--threads" => {
                let v = args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
                threads = v.parse().unwrap_or_else(|_| usage_and_exit(2));
                i += 2;
            }
            "--output" => {
                let v = args.get(i + 1).unwrap_or_else(|| usage_and_exit(2));
                output = Some(v.clone());
                i += 2;
            }
            "--verify" => {
                verify = true;
                i += 1;
            }
            "--help" | "-h" => usage_and_exit(0),
            other => {
                if other.starts_with('-') || words_file.is_some() {
                    eprintln!("Unexpected argument: {other}");
                    usage_and_exit(2);
                }
                words_file = Some(other.to_string());
                i += 1;
            }
        }
    }

    let words_file = words_file.unwrap_or_else(|| {
        eprintln!("Missing WORDS_FILE argument.");
        usage_and_exit(2)
    });
    if word_len == 0 || word_len > ALPHABET_LEN {
        eprintln!("Word length must be between 1 and {ALPHABET_LEN}, got {word_len}.");
        usage_and_exit(2);
    }
    let group_size = group_size.unwrap_or_else(|| default_group_size(word_len));
    if group_size < 2 {
        eprintln!("Group size must be at least 2, got {group_size}.");
        usage_and_exit(2);
    }

    println!("--------------------------------------------------");
    println!("Word groups: {group_size} x {word_len}-letter words, pairwise disjoint letters");
    println!(
        "Matrix: {repr} | reorder: {} | threads: {}",
        if reorder { "degree" } else { "off" },
        if threads == 0 {
            "auto".to_string()
        } else {
            threads.to_string()
        },
    );
    println!("--------------------------------------------------");

    let vocab_opts = VocabOptions {
        word_len,
        dedup_anagrams,
    };
    let t = Instant::now();
    let words = match load_vocabulary(&words_file, &vocab_opts) {
        Ok(w) => w,
        Err(e) => {
            eprintln!("Failed to read {words_file}: {e}");
            std::process::exit(1);
        }
    };
    println!(
        "Loaded {} usable words from {words_file} in {:.2}s",
        words.len(),
        t.elapsed().as_secs_f64()
    );

    let t = Instant::now();
    let result = if threads > 0 {
        match rayon::ThreadPoolBuilder::new().num_threads(threads).build() {
            Ok(pool) => pool.install(|| run_pipeline(words, repr, reorder, group_size)),
            Err(e) => {
                eprintln!("Failed to build thread pool: {e}");
                std::process::exit(1);
            }
        }
    } else {
        run_pipeline(words, repr, reorder, group_size)
    };
    let mut groups = match result {
        Ok(groups) => groups,
        Err(e) => {
            eprintln!("Search failed: {e}");
            std::process::exit(1);
        }
    };
    println!("Total pipeline time: {:.2}s", t.elapsed().as_secs_f64());

    canonical_order(&mut groups);

    if verify {
        if let Err(e) = verify_groups(&groups, group_size) {
            eprintln!("Verification FAILED: {e}");
            std::process::exit(1);
        }
        println!("Verification OK: every group checks out.");
    }

    match output {
        Some(path) => {
            let file = match File::create(&path) {
                Ok(f) => f,
                Err(e) => {
                    eprintln!("Failed to create {path}: {e}");
                    std::process::exit(1);
                }
            };
            let mut out = BufWriter::new(file);
            if let Err(e) = write_tsv(&groups, &mut out).and_then(|()| out.flush()) {
                eprintln!("Failed to write {path}: {e}");
                std::process::exit(1);
            }
            println!("Wrote {} group(s) to {path}", groups.len());
        }
        None => {
            if groups.is_empty() {
                println!("No groups of {group_size} disjoint words exist in this list.");
            } else {
                println!();
                for group in &groups {
                    let unused = group.letters().complement();
                    if unused.is_empty() {
                        println!("  {group}");
                    } else {
                        println!("  {group}   (unused: {unused})");
                    }
                }
            }
        }
    }
}

fn run_pipeline(
    words: Vec<Word>,
    repr: MatrixRepr,
    reorder: bool,
    group_size: usize,
) -> Result<Vec<WordGroup>, SearchError> {
    let t = Instant::now();
    let matrix = CompatibilityMatrix::build(&words, repr)?;
    println!(
        "Built {n} x {n} {repr} matrix: {} compatible pairs, {} bytes, {:.2}s",
        matrix.edge_count(),
        matrix.size_in_bytes(),
        t.elapsed().as_secs_f64(),
        n = matrix.n(),
    );

    let (matrix, words) = if reorder {
        let t = Instant::now();
        let reordered = reorder_by_degree(&matrix, &words)?;
        println!(
            "Reordered by ascending degree in {:.2}s",
            t.elapsed().as_secs_f64()
        );
        (reordered.matrix, reordered.words)
    } else {
        (matrix, words)
    };

    let t = Instant::now();
    let groups = find_cliques(&matrix, &words, group_size)?;
    println!(
        "Search finished in {:.2}s: {} group(s)",
        t.elapsed().as_secs_f64(),
        groups.len()
    );
    Ok(groups)
}

fn usage_and_exit(code: i32) -> ! {
    eprintln!(
        "Usage:\n  wordclique [OPTIONS] WORDS_FILE\n\nFinds every group of letter-disjoint words of a fixed length.\n\nOptions:\n  --length N       Word length to keep from the list (default: 5)\n  --group-size N   Words per group (default: 26 / length)\n  --packed         One bit per matrix cell (default)\n  --expanded       One byte per matrix cell\n  --keep-anagrams  Keep every anagram instead of one per letter set\n  --no-reorder     Skip the ascending-degree reordering\n  --threads N      Worker threads (default: all cores)\n  --output FILE    Write groups as tab-separated lines to FILE\n  --verify         Re-check every group after the search\n  -h, --help       Show this help\n"
    );
    std::process::exit(code)
}
