//! flac2mp3 - 将FLAC转换为MP3，可选保留封面与标签

use anarky::tools::{self, Workflow};

fn main() {
    tools::main_for(Workflow::FlacToMp3)
}
