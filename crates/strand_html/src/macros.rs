//! The `html!` template literal macro.

/// Build a [`Template`](crate::Template) from literals and `{expr}` values.
///
/// String literals are trusted markup; each braced expression is converted
/// with `Into<Value>` and classified. Evaluates to
/// `TemplateResult<Template>`.
///
/// ```rust
/// use strand_html::{html, render};
///
/// let name = "<Ada>";
/// let template = html!("<p>Hello " {name} "!</p>").unwrap();
/// assert_eq!(render(&template), "<p>Hello &lt;Ada&gt;!</p>");
/// ```
#[macro_export]
macro_rules! html {
    ($($part:tt)*) => {{
        #[allow(unused_mut)]
        let mut builder = $crate::TemplateBuilder::new();
        $( $crate::__html_part!(builder, $part); )*
        builder.finish()
    }};
}

#[doc(hidden)]
#[macro_export]
macro_rules! __html_part {
    ($builder:ident, { $value:expr }) => {
        $builder.interpolate($value);
    };
    ($builder:ident, $literal:literal) => {
        $builder.literal($literal);
    };
}
