// src/output.rs
//
// One line per processed frame: `<groupId>;<timestampMicroseconds>;<steeringAngle>`.
// No header row. Flushed per line so a downstream reader sees frames as they land.

use std::io::{self, Write};

pub fn format_line(group_id: &str, timestamp_us: u64, angle: f32) -> String {
    format!("{};{};{}", group_id, timestamp_us, angle)
}

pub struct SteeringWriter<W: Write> {
    out: W,
    group_id: String,
    lines: u64,
}

impl<W: Write> SteeringWriter<W> {
    pub fn new(out: W, group_id: impl Into<String>) -> Self {
        Self {
            out,
            group_id: group_id.into(),
            lines: 0,
        }
    }

    pub fn write(&mut self, timestamp_us: u64, angle: f32) -> io::Result<()> {
        writeln!(
            self.out,
            "{}",
            format_line(&self.group_id, timestamp_us, angle)
        )?;
        self.out.flush()?;
        self.lines += 1;
        Ok(())
    }

    pub fn lines(&self) -> u64 {
        self.lines
    }

    #[cfg(test)]
    pub fn into_inner(self) -> W {
        self.out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_format() {
        assert_eq!(
            format_line("group_09", 1_600_000_000_123_456, 0.025),
            "group_09;1600000000123456;0.025"
        );
        assert_eq!(format_line("g", 7, 0.0), "g;7;0");
        assert_eq!(format_line("g", 7, -0.12), "g;7;-0.12");
    }

    #[test]
    fn test_writer_emits_one_line_per_frame() {
        let mut writer = SteeringWriter::new(Vec::new(), "group_09");
        writer.write(10, 0.0).unwrap();
        writer.write(20, 0.05).unwrap();
        assert_eq!(writer.lines(), 2);

        let text = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(text, "group_09;10;0\ngroup_09;20;0.05\n");
    }
}
