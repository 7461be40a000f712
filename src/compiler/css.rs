//! Inline `style` attribute parsing.
//!
//! Only the properties the markup can express are read: `color`,
//! `background-color`, `text-align`, `font-family` and `font-size`.
//! Everything else is consumed and dropped. CSS-wide keywords (`inherit`,
//! `initial`, `unset`) leave the property undeclared, so it inherits.

use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, Parser, ParserInput, ParserState,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser, Token,
};

use crate::ir::{Color, DeclaredStyle, Length, TextAlign};

/// Parse the contents of a `style` attribute.
///
/// Invalid declarations are skipped; parsing never fails.
pub fn parse_inline_style(css: &str) -> DeclaredStyle {
    let mut style = DeclaredStyle::default();
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut decl_parser = InlineStyleParser { style: &mut style };

    for result in RuleBodyParser::new(&mut parser, &mut decl_parser) {
        if let Err((err, source)) = result {
            log::trace!("skipping declaration `{source}`: {:?}", err.kind);
        }
    }

    style
}

struct InlineStyleParser<'a> {
    style: &'a mut DeclaredStyle,
}

impl<'i> AtRuleParser<'i> for InlineStyleParser<'_> {
    type Prelude = ();
    type AtRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        _name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> QualifiedRuleParser<'i> for InlineStyleParser<'_> {
    type Prelude = ();
    type QualifiedRule = ();
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> DeclarationParser<'i> for InlineStyleParser<'_> {
    type Declaration = ();
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let property = name.to_ascii_lowercase();
        match property.as_str() {
            "color" => self.style.color = parse_color(input),
            "background-color" | "background" => {
                self.style.background_color = parse_color(input);
            }
            "text-align" => self.style.text_align = parse_text_align(input),
            "font-family" => self.style.font_family = parse_font_family(input),
            "font-size" => self.style.font_size = parse_length(input),
            _ => {}
        }

        // Drop whatever is left (`!important`, trailing tokens, unknown values).
        while input.next().is_ok() {}
        Ok(())
    }
}

impl<'i> RuleBodyItemParser<'i, (), ()> for InlineStyleParser<'_> {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}

fn is_wide_keyword(ident: &str) -> bool {
    matches!(ident, "inherit" | "initial" | "unset" | "revert")
}

fn parse_color(input: &mut Parser<'_, '_>) -> Option<Color> {
    if let Ok(ident) = input.try_parse(|i| i.expect_ident_cloned()) {
        let ident = ident.to_ascii_lowercase();
        return match ident.as_str() {
            "transparent" => Some(Color::TRANSPARENT),
            "grey" => Some(Color::rgb(128, 128, 128)),
            name if is_wide_keyword(name) => None,
            name => Color::from_name(name),
        };
    }

    if let Ok(color) = input.try_parse(parse_hash_color) {
        return Some(color);
    }

    input.try_parse(parse_rgb_function).ok()
}

fn parse_hash_color<'i>(input: &mut Parser<'i, '_>) -> Result<Color, ParseError<'i, ()>> {
    let location = input.current_source_location();
    match input.next()? {
        Token::IDHash(hash) | Token::Hash(hash) => {
            parse_hex_color(hash.as_ref()).ok_or_else(|| location.new_custom_error(()))
        }
        _ => Err(location.new_custom_error(())),
    }
}

fn parse_hex_color(hex: &str) -> Option<Color> {
    if !hex.is_ascii() {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
    match hex.len() {
        3 | 4 => {
            let short = |i: usize| u8::from_str_radix(&hex[i..i + 1], 16).ok().map(|v| v * 17);
            let a = if hex.len() == 4 { short(3)? } else { 255 };
            Some(Color::rgba(short(0)?, short(1)?, short(2)?, a))
        }
        6 => Some(Color::rgb(channel(0)?, channel(2)?, channel(4)?)),
        8 => Some(Color::rgba(channel(0)?, channel(2)?, channel(4)?, channel(6)?)),
        _ => None,
    }
}

/// `rgb(r, g, b)`, `rgba(r, g, b, a)`, or `rgb(r g b / a)`.
fn parse_rgb_function<'i>(input: &mut Parser<'i, '_>) -> Result<Color, ParseError<'i, ()>> {
    let location = input.current_source_location();
    let name = input.expect_function()?.clone();
    if !name.eq_ignore_ascii_case("rgb") && !name.eq_ignore_ascii_case("rgba") {
        return Err(location.new_custom_error(()));
    }

    input.parse_nested_block(|input| {
        let r = parse_color_component(input)?;
        let comma = input.try_parse(|i| i.expect_comma()).is_ok();
        let g = parse_color_component(input)?;
        if comma {
            input.expect_comma()?;
        }
        let b = parse_color_component(input)?;

        let has_alpha = if comma {
            input.try_parse(|i| i.expect_comma()).is_ok()
        } else {
            input.try_parse(|i| i.expect_delim('/')).is_ok()
        };
        let a = if has_alpha {
            parse_alpha_component(input)?
        } else {
            255
        };
        Ok(Color::rgba(r, g, b, a))
    })
}

fn parse_color_component<'i>(input: &mut Parser<'i, '_>) -> Result<u8, ParseError<'i, ()>> {
    let location = input.current_source_location();
    match input.next()? {
        Token::Number { value, .. } => Ok(value.round().clamp(0.0, 255.0) as u8),
        Token::Percentage { unit_value, .. } => {
            Ok((unit_value * 255.0).round().clamp(0.0, 255.0) as u8)
        }
        _ => Err(location.new_custom_error(())),
    }
}

fn parse_alpha_component<'i>(input: &mut Parser<'i, '_>) -> Result<u8, ParseError<'i, ()>> {
    let location = input.current_source_location();
    let unit = match input.next()? {
        Token::Number { value, .. } => *value,
        Token::Percentage { unit_value, .. } => *unit_value,
        _ => return Err(location.new_custom_error(())),
    };
    Ok((unit.clamp(0.0, 1.0) * 255.0).round() as u8)
}

fn parse_length(input: &mut Parser<'_, '_>) -> Option<Length> {
    match input.next().ok()? {
        Token::Dimension { value, unit, .. } => match unit.to_ascii_lowercase().as_str() {
            "px" => Some(Length::Px(*value)),
            "pt" => Some(Length::Pt(*value)),
            "em" => Some(Length::Em(*value)),
            "rem" => Some(Length::Rem(*value)),
            _ => None,
        },
        Token::Percentage { unit_value, .. } => Some(Length::Percent(*unit_value * 100.0)),
        _ => None,
    }
}

fn parse_text_align(input: &mut Parser<'_, '_>) -> Option<TextAlign> {
    let token = input.expect_ident_cloned().ok()?;
    match token.to_ascii_lowercase().as_str() {
        "left" | "start" => Some(TextAlign::Left),
        "right" | "end" => Some(TextAlign::Right),
        "center" => Some(TextAlign::Center),
        "justify" => Some(TextAlign::Justify),
        _ => None,
    }
}

fn parse_font_family(input: &mut Parser<'_, '_>) -> Option<String> {
    let mut families = Vec::new();

    loop {
        if let Ok(token) = input.try_parse(|i| i.expect_string_cloned()) {
            families.push(token.to_string());
        } else {
            // Unquoted names may span several identifiers: `Times New Roman`.
            let mut words = Vec::new();
            while let Ok(token) = input.try_parse(|i| i.expect_ident_cloned()) {
                words.push(token.to_string());
            }
            if words.is_empty() {
                break;
            }
            families.push(words.join(" "));
        }

        if input.try_parse(|i| i.expect_comma()).is_err() {
            break;
        }
    }

    match families.as_slice() {
        [] => None,
        [single] if is_wide_keyword(single) => None,
        _ => Some(families.join(", ")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_multiple_declarations() {
        let style = parse_inline_style("color: blue; text-align: center; font-size: 14pt");

        assert_eq!(style.color, Some(Color::rgb(0, 0, 255)));
        assert_eq!(style.text_align, Some(TextAlign::Center));
        assert_eq!(style.font_size, Some(Length::Pt(14.0)));
    }

    #[test]
    fn test_parse_hex_colors() {
        let style = parse_inline_style("color: #ff0000; background-color: #0f0");

        assert_eq!(style.color, Some(Color::rgb(255, 0, 0)));
        assert_eq!(style.background_color, Some(Color::rgb(0, 255, 0)));
    }

    #[test]
    fn test_parse_rgb_functions() {
        let style = parse_inline_style("color: rgb(255, 136, 0); background-color: rgba(0,0,0,0)");

        assert_eq!(style.color, Some(Color::rgb(255, 136, 0)));
        assert_eq!(style.background_color, Some(Color::TRANSPARENT));
    }

    #[test]
    fn test_parse_space_separated_rgb() {
        let style = parse_inline_style("color: rgb(10 20 30 / 50%)");
        assert_eq!(style.color, Some(Color::rgba(10, 20, 30, 128)));
    }

    #[test]
    fn test_wide_keywords_leave_property_undeclared() {
        let style = parse_inline_style("color: inherit; font-family: inherit");
        assert!(style.is_empty());
    }

    #[test]
    fn test_parse_lengths() {
        assert_eq!(
            parse_inline_style("font-size: 16px").font_size,
            Some(Length::Px(16.0))
        );
        assert_eq!(
            parse_inline_style("font-size: 1.5em").font_size,
            Some(Length::Em(1.5))
        );
        assert_eq!(
            parse_inline_style("font-size: 120%").font_size,
            Some(Length::Percent(120.0))
        );
        assert_eq!(parse_inline_style("font-size: large").font_size, None);
    }

    #[test]
    fn test_font_family_lists() {
        let style = parse_inline_style("font-family: \"Helvetica Neue\", Times New Roman, sans-serif");
        assert_eq!(
            style.font_family.as_deref(),
            Some("Helvetica Neue, Times New Roman, sans-serif")
        );
    }

    #[test]
    fn test_invalid_declarations_are_skipped() {
        let style = parse_inline_style("color: ; margin: 2px; ???; text-align: right !important");
        assert_eq!(style.color, None);
        assert_eq!(style.text_align, Some(TextAlign::Right));
    }
}
