//! flac2wav - 将FLAC解码为WAV，可选提取封面与标签

use anarky::tools::{self, Workflow};

fn main() {
    tools::main_for(Workflow::FlacToWav)
}
