use ratatui::widgets::Block;
use ratatui::widgets::BorderType;
use ratatui::widgets::Borders;
use ratatui::widgets::Padding;

pub struct TextArea {}

impl<'a> TextArea {
    fn with_title(lines: Vec<String>, title: &'a str) -> tui_textarea::TextArea<'a> {
        let mut textarea = tui_textarea::TextArea::new(lines);
        textarea.set_block(
            Block::default()
                .borders(Borders::ALL)
                .border_type(BorderType::Double)
                .title(title)
                .padding(Padding::new(1, 1, 0, 0)),
        );

        return textarea;
    }

    pub fn default() -> tui_textarea::TextArea<'a> {
        return TextArea::with_title(vec!["".to_string()], "Describe the image to generate");
    }

    pub fn with_prompt(prompt: &str) -> tui_textarea::TextArea<'a> {
        let lines = prompt
            .split('\n')
            .map(|line| return line.to_string())
            .collect::<Vec<String>>();
        let mut textarea =
            TextArea::with_title(lines, "Describe the image to generate");
        textarea.move_cursor(tui_textarea::CursorMove::Bottom);
        textarea.move_cursor(tui_textarea::CursorMove::End);

        return textarea;
    }

    pub fn credential() -> tui_textarea::TextArea<'a> {
        let mut textarea = TextArea::with_title(vec!["".to_string()], "API key");
        textarea.set_mask_char('*');

        return textarea;
    }
}
