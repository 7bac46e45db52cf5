//! Arabic text folding used before any Arabic matching.

const TATWEEL: char = '\u{0640}';

fn is_diacritic(c: char) -> bool {
    matches!(c, '\u{0617}'..='\u{061A}' | '\u{064B}'..='\u{0652}')
}

/// Replaces the Latin digits Arabizi uses for Arabic letters.
pub fn dearabizi(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '2' => 'ا',
            '3' => 'ع',
            '5' => 'خ',
            '6' => 'ط',
            '7' => 'ح',
            '8' => 'ق',
            '9' => 'ص',
            other => other,
        })
        .collect()
}

/// Folds Arabic spelling variants so that matching is insensitive to them:
/// drops tatweel and diacritics, unifies `أ/إ/آ` to `ا`, `ى` to `ي` and `ة`
/// to `ه`, and collapses runs of three or more identical characters.
pub fn normalize(text: &str) -> String {
    let folded = text.chars().filter(|&c| c != TATWEEL && !is_diacritic(c)).map(|c| match c {
        'أ' | 'إ' | 'آ' => 'ا',
        'ى' => 'ي',
        'ة' => 'ه',
        other => other,
    });
    collapse_repeats(folded)
}

fn collapse_repeats(chars: impl Iterator<Item = char>) -> String {
    fn push_run(out: &mut String, run: Option<(char, usize)>) {
        if let Some((c, len)) = run {
            let keep = if len >= 3 { 1 } else { len };
            out.extend(std::iter::repeat_n(c, keep));
        }
    }

    let mut out = String::new();
    let mut run: Option<(char, usize)> = None;
    for c in chars {
        match run {
            Some((prev, len)) if prev == c => run = Some((prev, len + 1)),
            _ => {
                push_run(&mut out, run);
                run = Some((c, 1));
            }
        }
    }
    push_run(&mut out, run);
    out
}
