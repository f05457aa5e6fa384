//! Built-in prompts and fixed user-facing text
//!
//! The product's display language is Arabic; everything the user or the
//! model reads verbatim lives here.

/// Built-in prompts that don't require files
pub mod builtin {
    /// Synthetic first prompt of every session. Sent with an empty history.
    pub const INITIAL_PROMPT: &str = "أنت تبدأ محادثة جديدة. استخدم دالة getAllUserData لفحص ذاكرة المستخدم. ابحث عن أي أحداث قادمة هذا الأسبوع أو أي معلومات مثيرة للاهتمام. ثم، قم بإنشاء تحية ودية واستباقية. إذا كانت الذاكرة فارغة، قدم تحية ترحيبية قياسية.";

    /// Appended to the transcript once, when the daily limit is reached
    pub const LIMIT_REACHED: &str = "لقد وصلت إلى حد الاستخدام اليومي. يرجى المحاولة مرة أخرى غداً.";

    /// Prefix of every exchange failure shown to the user
    pub const EXCHANGE_FAILED: &str = "عذراً، حدث خطأ أثناء الاتصال بالمساعد";

    /// Cause used when the failure carries no readable detail
    pub const TRY_AGAIN: &str = "يرجى المحاولة مرة أخرى.";

    /// Input placeholder once the daily budget is spent
    pub const INPUT_DISABLED: &str = "لقد وصلت إلى الحد اليومي.";

    /// Typing indicator label
    pub const TYPING: &str = "يكتب...";

    /// Shown when the memory panel is empty
    pub const MEMORY_EMPTY: &str = "لا توجد معلومات محفوظة في الذاكرة حتى الآن.";

    /// Usage line under the input, e.g. "استخدام اليوم: 3 / 30"
    pub fn usage_line(count: u32, limit: u32) -> String {
        format!("استخدام اليوم: {} / {}", count, limit)
    }
}
