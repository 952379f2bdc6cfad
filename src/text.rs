//! Draft-text helpers.
//!
//! The service understands inline `<pause 1s>` / `<pause 500ms>` / `<pause 500>`
//! tags and `<slow>`/`<fast>` speed tags. Pause tags are not spoken, so they are
//! left out of the visible character count.

use once_cell::sync::Lazy;
use regex::Regex;
use std::borrow::Cow;

static PAUSE_TAG: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)<pause\s*[\d.]*\s*(?:s|ms)?\s*>").expect("pause tag pattern is valid")
});

/// Sample text shown to first-time users.
pub const EXAMPLE_TEXT: &str = "Hello, this is a test of the text-to-speech system.

I will now pause for one second.<pause 1s>

The pause above was one second long.

Here's an example with speed control. <slow>This part will be spoken slowly.</slow><pause 500>And <fast>this part will be spoken quickly.</fast>

You can combine pauses and speed tags:
<slow>Important message here.</slow><pause 1s>
Then continue at normal speed.

Both pause tags and speed tags work together in the same text.";

pub fn strip_pause_tags(text: &str) -> Cow<'_, str> {
    PAUSE_TAG.replace_all(text, "")
}

/// Number of characters left after removing pause tags.
pub fn visible_char_count(text: &str) -> usize {
    strip_pause_tags(text).chars().count()
}
