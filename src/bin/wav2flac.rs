//! wav2flac - 将WAV编码为FLAC，可选写入封面与标签

use anarky::tools::{self, Workflow};

fn main() {
    tools::main_for(Workflow::WavToFlac)
}
