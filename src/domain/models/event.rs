use tui_textarea::Input;

use super::GeneratedImage;
use super::GenerationRequest;
use super::NotificationKind;

pub enum Event {
    GenerationFailed(GenerationRequest, String),
    GenerationSucceeded(GenerationRequest, GeneratedImage),
    KeyboardCharInput(Input),
    KeyboardCTRLC(),
    KeyboardCTRLR(),
    KeyboardEnter(),
    KeyboardEsc(),
    KeyboardPaste(String),
    KeyboardTab(),
    Notify(String, NotificationKind),
    UIResize(),
    UITick(),
}
