use rand::Rng;

/// Canned follow-up advice shown with each screening result. One entry is
/// picked uniformly at random per analysis; repeated uploads may see
/// different suggestions for the same label.
pub const DEPRESSED_SUGGESTIONS: &[&str] = &[
    "It's okay to feel down sometimes. Try setting aside time for things that bring you joy, like watching a movie with someone close, playing a game, or talking with a friend.",
    "Regular exercise and healthy meals can lift your mood more than you'd expect. Don't skimp on sleep either.",
    "There are many guided meditation and online therapy apps that can help. Even a short daily session makes a difference.",
    "If your feelings become too heavy to carry alone, please reach out to a psychologist or therapist. Asking for help is a strength.",
    "Consider joining an online community or support group. Sharing what you're going through can be a real relief.",
    "Write down a list of things you enjoy and start doing them again. Picking a hobby back up is a good first step.",
    "If you're on prescribed medication, follow your doctor's directions and don't stop without consulting them first.",
    "Try relaxation exercises such as deep breathing or meditation to take the edge off stress.",
];

pub const NOT_DEPRESSED_SUGGESTIONS: &[&str] = &[
    "Great to hear you're doing well! Keep looking after your mental health — watch your sleep, meals, and daily activity.",
    "If you notice a significant change in how you feel, don't hesitate to check in with a doctor or nurse.",
    "Make time for hobbies and activities that keep your mood up.",
    "Spend time with the people who care about you. Healthy social connections go a long way.",
    "Avoid alcohol and drugs — they can drag your mental state down. Reach out to someone you trust when you need to talk.",
    "Get outside when you can. Sunshine and fresh air do wonders for your mood.",
    "If you feel anxious or stressed, try stress-management techniques like yoga or meditation.",
];

/// Fallback for label strings the selector does not recognize.
pub const GENERAL_SUGGESTIONS: &[&str] = &[
    "Keep an eye on your mood and check in with yourself regularly.",
    "A consistent sleep schedule and regular exercise support mental wellbeing.",
    "If anything feels off, talking to a professional is always a good option.",
];

/// Uniformly-random pick from the list for `label`. Unrecognized labels
/// degrade to the general list rather than failing.
pub fn select_suggestion<R: Rng + ?Sized>(label: &str, rng: &mut R) -> &'static str {
    let pool = match label {
        "depressed" => DEPRESSED_SUGGESTIONS,
        "not_depressed" => NOT_DEPRESSED_SUGGESTIONS,
        _ => GENERAL_SUGGESTIONS,
    };
    pool[rng.gen_range(0..pool.len())]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{rngs::StdRng, SeedableRng};

    #[test]
    fn depressed_picks_come_from_the_depressed_list() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let pick = select_suggestion("depressed", &mut rng);
            assert!(!pick.is_empty());
            assert!(DEPRESSED_SUGGESTIONS.contains(&pick));
        }
    }

    #[test]
    fn not_depressed_picks_come_from_the_not_depressed_list() {
        let mut rng = rand::thread_rng();
        for _ in 0..200 {
            let pick = select_suggestion("not_depressed", &mut rng);
            assert!(!pick.is_empty());
            assert!(NOT_DEPRESSED_SUGGESTIONS.contains(&pick));
        }
    }

    #[test]
    fn unknown_label_falls_back_to_general_list() {
        let mut rng = rand::thread_rng();
        for label in ["", "severity:high", "depresi", "unknown"] {
            let pick = select_suggestion(label, &mut rng);
            assert!(!pick.is_empty());
            assert!(GENERAL_SUGGESTIONS.contains(&pick));
        }
    }

    #[test]
    fn seeded_rng_makes_selection_deterministic() {
        let a = select_suggestion("depressed", &mut StdRng::seed_from_u64(99));
        let b = select_suggestion("depressed", &mut StdRng::seed_from_u64(99));
        assert_eq!(a, b);
    }

    #[test]
    fn lists_are_non_empty() {
        assert!(!DEPRESSED_SUGGESTIONS.is_empty());
        assert!(!NOT_DEPRESSED_SUGGESTIONS.is_empty());
        assert!(!GENERAL_SUGGESTIONS.is_empty());
    }
}
