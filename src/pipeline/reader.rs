use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::Path;

/// Reads question and answer lines in lockstep.
///
/// Stops at the first pair where either side is exhausted or empty.
pub struct PairReader<Q, A> {
    questions: Q,
    answers: A,
    done: bool,
}

impl PairReader<BufReader<File>, BufReader<File>> {
    pub fn open<P: AsRef<Path>>(questions: P, answers: P) -> io::Result<Self> {
        Ok(Self::new(
            BufReader::new(File::open(questions)?),
            BufReader::new(File::open(answers)?),
        ))
    }
}

impl<Q: BufRead, A: BufRead> PairReader<Q, A> {
    pub fn new(questions: Q, answers: A) -> Self {
        Self {
            questions,
            answers,
            done: false,
        }
    }

    pub fn next_pair(&mut self) -> io::Result<Option<(String, String)>> {
        if self.done {
            return Ok(None);
        }

        let question = read_line(&mut self.questions)?;
        let answer = read_line(&mut self.answers)?;

        match (question, answer) {
            (Some(q), Some(a)) if !q.is_empty() && !a.is_empty() => Ok(Some((q, a))),
            _ => {
                self.done = true;
                Ok(None)
            }
        }
    }
}

impl<Q: BufRead, A: BufRead> Iterator for PairReader<Q, A> {
    type Item = io::Result<(String, String)>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_pair().transpose()
    }
}

/// One line without its terminator; `None` at end of input.
///
/// Lines are raw bytes; invalid UTF-8 is replaced rather than rejected, so a
/// bad line only turns its tokens into unknown words.
fn read_line<R: BufRead>(reader: &mut R) -> io::Result<Option<String>> {
    let mut line = Vec::new();
    if reader.read_until(b'\n', &mut line)? == 0 {
        return Ok(None);
    }
    if line.last() == Some(&b'\n') {
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
    }
    Ok(Some(match String::from_utf8(line) {
        Ok(line) => line,
        Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
    }))
}
