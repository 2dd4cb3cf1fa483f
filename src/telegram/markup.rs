//! Conversion from transport-neutral keyboards to Telegram inline markup.

use teloxide::types::{InlineKeyboardButton, InlineKeyboardMarkup};

use crate::commands::Keyboard;

/// Builds an inline keyboard, one callback button per row.
#[must_use]
pub fn inline_markup(keyboard: &Keyboard) -> InlineKeyboardMarkup {
    InlineKeyboardMarkup::new(keyboard.rows().iter().map(|row| {
        row.iter()
            .map(|b| InlineKeyboardButton::callback(b.label.clone(), b.action.encode()))
            .collect::<Vec<_>>()
    }))
}

#[cfg(test)]
mod tests {
    use teloxide::types::InlineKeyboardButtonKind;

    use super::*;
    use crate::commands::CallbackAction;

    #[test]
    fn test_inline_markup_encodes_actions() {
        let keyboard = Keyboard::new()
            .button("Stop: trainer", CallbackAction::Stop("pod-1".to_owned()))
            .with_cancel();

        let markup = inline_markup(&keyboard);
        assert_eq!(markup.inline_keyboard.len(), 2);

        let first = &markup.inline_keyboard[0][0];
        assert_eq!(first.text, "Stop: trainer");
        assert_eq!(
            first.kind,
            InlineKeyboardButtonKind::CallbackData("stop_pod-1".to_owned())
        );

        let cancel = &markup.inline_keyboard[1][0];
        assert_eq!(
            cancel.kind,
            InlineKeyboardButtonKind::CallbackData("cancel".to_owned())
        );
    }
}
