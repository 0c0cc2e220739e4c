//! Emoji used across the terminal UI, with plain-text fallbacks.

use console::Emoji;

// Notification levels
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "[OK]");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "[ERR]");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "[i]");

// Popup
pub static GIFT: Emoji<'_, '_> = Emoji("🎁 ", "*");
pub static MAIL: Emoji<'_, '_> = Emoji("📧 ", "@");
pub static KEY: Emoji<'_, '_> = Emoji("🔑 ", "#");
pub static MONEY: Emoji<'_, '_> = Emoji("💰 ", "$");
