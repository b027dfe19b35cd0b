//! wav2mp3 - 将WAV编码为MP3，可选写入封面与标签

use anarky::tools::{self, Workflow};

fn main() {
    tools::main_for(Workflow::WavToMp3)
}
