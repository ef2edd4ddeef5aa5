/// Compile-time layout tokens for the editor window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StyleTokens {
    pub spacing_4: i32,
    pub spacing_8: i32,
    pub spacing_12: i32,
    pub window_default_width: i32,
    pub window_default_height: i32,
    pub canvas_min_width: i32,
    pub canvas_min_height: i32,
    pub sidebar_width: i32,
    pub layer_list_min_height: i32,
    pub text_field_min_height: i32,
}

pub const LAYOUT_TOKENS: StyleTokens = StyleTokens {
    spacing_4: 4,
    spacing_8: 8,
    spacing_12: 12,
    window_default_width: 1200,
    window_default_height: 760,
    canvas_min_width: 480,
    canvas_min_height: 270,
    sidebar_width: 320,
    layer_list_min_height: 160,
    text_field_min_height: 72,
};

#[cfg(test)]
mod tests {
    use super::LAYOUT_TOKENS;

    #[test]
    fn window_fits_canvas_and_sidebar() {
        let tokens = LAYOUT_TOKENS;
        assert!(
            tokens.window_default_width
                >= tokens.canvas_min_width + tokens.sidebar_width + tokens.spacing_12 * 3
        );
        assert!(tokens.window_default_height > tokens.canvas_min_height);
    }

    #[test]
    fn canvas_minimum_keeps_fallback_aspect() {
        let tokens = LAYOUT_TOKENS;
        assert_eq!(tokens.canvas_min_width * 9, tokens.canvas_min_height * 16);
    }
}
