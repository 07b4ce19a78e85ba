use proptest::prelude::*;
use huddle_engine::render::wrap;
use huddle_engine::session::{parse_command, unfurl};
use huddle_engine::standup::{Category, Updates};

fn category() -> impl Strategy<Value = Category> {
    prop_oneof![
        Just(Category::Done),
        Just(Category::Blocked),
        Just(Category::Goals),
    ]
}

proptest! {
    #[test]
    fn test_unfurl_leaves_plain_text_alone(text in "[^<]{0,80}") {
        prop_assert_eq!(unfurl(&text).unwrap(), text);
    }

    #[test]
    fn test_unfurl_is_idempotent(
        prefix in "[a-z ]{0,12}",
        target in "[a-z:/.]{1,20}",
        label in "[a-z ]{1,12}",
        suffix in "[a-z ]{0,12}",
    ) {
        let text = format!("{}<{}|{}>{}", prefix, target, label, suffix);
        let once = unfurl(&text).unwrap();
        prop_assert_eq!(&once, &format!("{}{}{}", prefix, label, suffix));
        prop_assert_eq!(unfurl(&once).unwrap(), once);
    }

    #[test]
    fn test_reset_one_category_isolated(
        entries in prop::collection::vec((category(), "[a-z ]{1,20}"), 0..20),
        target in category(),
    ) {
        let mut updates = Updates::new();
        for (category, entry) in &entries {
            updates.push(*category, entry.clone());
        }
        let before = updates.clone();

        updates.clear(target);

        for category in Category::ALL {
            if category == target {
                prop_assert!(updates.entries(category).is_empty());
            } else {
                prop_assert_eq!(updates.entries(category), before.entries(category));
            }
        }
    }

    #[test]
    fn test_wrapped_lines_fit(words in prop::collection::vec("[a-z]{1,10}", 1..40)) {
        let text = words.join(" ");
        for line in wrap(&text, 30, "* ", "  ").lines() {
            prop_assert!(line.chars().count() <= 30, "line too long: {:?}", line);
        }
    }

    #[test]
    fn test_unmentioned_text_keeps_its_words(word in "[a-z]{1,8}", rest in "[a-z ]{0,30}") {
        let text = format!("{} {}", word, rest);
        let parsed = parse_command(&text, Some("<@UBOT>"));
        prop_assert!(!parsed.mentioned);
        prop_assert_eq!(parsed.command, word);
    }
}
