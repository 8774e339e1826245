//! Replacement of matches.

use crate::errors::MatchError;
use crate::result::MatchResult;

use super::Matcher;

fn invalid<T, S: Into<String>>(description: S) -> Result<T, MatchError> {
    Err(MatchError::InvalidReplacement(description.into()))
}

impl<'h> Matcher<'h> {
    /// Expands a replacement template with the groups of the current match.
    ///
    /// `$n` is replaced by group `n`, taking as many digits as possible
    /// while the number is still a group of the pattern. `${name}` is
    /// replaced by a named group. A backslash makes the next character
    /// literal. Groups that didn't participate are replaced by nothing.
    fn expand(
        &self,
        template: &str,
        out: &mut String,
    ) -> Result<(), MatchError> {
        let mut chars = template.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '\\' => match chars.next() {
                    Some(c) => out.push(c),
                    None => {
                        return invalid("character to be escaped is missing")
                    }
                },
                '$' => {
                    let group = match chars.next() {
                        None => return invalid("group index is missing"),
                        Some('{') => {
                            let mut name = String::new();
                            while let Some(c) =
                                chars.next_if(|c| c.is_ascii_alphanumeric())
                            {
                                name.push(c);
                            }
                            if name.is_empty() {
                                return invalid(
                                    "named capturing group has 0 length name",
                                );
                            }
                            if chars.next() != Some('}') {
                                return invalid(concat!(
                                    "named capturing group is missing ",
                                    "trailing '}'"
                                ));
                            }
                            if name.starts_with(|c: char| c.is_ascii_digit()) {
                                return invalid(format!(
                                    "capturing group name {{{}}} starts \
                                     with digit character",
                                    name
                                ));
                            }
                            self.named_group(&name)?
                        }
                        Some(c) => {
                            let Some(digit) = c.to_digit(10) else {
                                return invalid("Illegal group reference");
                            };
                            let mut group = digit as usize;
                            // Take more digits while the number is a valid
                            // group.
                            while let Some(digit) =
                                chars.peek().and_then(|c| c.to_digit(10))
                            {
                                let candidate = group * 10 + digit as usize;
                                if candidate > self.group_count() {
                                    break;
                                }
                                group = candidate;
                                chars.next();
                            }
                            group
                        }
                    };
                    if let Some(text) = self.group(group)? {
                        out.push_str(text);
                    }
                }
                c => out.push(c),
            }
        }

        Ok(())
    }

    /// Appends to `buf` the text between the end of the previously appended
    /// match (or the beginning of the input) and the current match,
    /// followed by the expansion of `template`.
    ///
    /// Together with [`Matcher::append_tail`] this allows building the
    /// result of a replacement step by step:
    ///
    /// ```
    /// # use regulus::Pattern;
    /// let pattern = Pattern::new("cat").unwrap();
    /// let mut matcher = pattern.matcher("one cat two cats in the yard");
    /// let mut buf = String::new();
    ///
    /// while matcher.find() {
    ///     matcher.append_replacement(&mut buf, "dog").unwrap();
    /// }
    /// matcher.append_tail(&mut buf);
    ///
    /// assert_eq!(buf, "one dog two dogs in the yard");
    /// ```
    ///
    /// If the template is invalid, or the match starts before the end of
    /// the previously appended one, the error is returned and `buf` is left
    /// untouched.
    pub fn append_replacement(
        &mut self,
        buf: &mut String,
        template: &str,
    ) -> Result<&mut Self, MatchError> {
        let (start, end) = self.span(0)?.ok_or(MatchError::NoMatch)?;

        if start < self.last_append {
            return Err(MatchError::AppendPosition {
                start,
                append_position: self.last_append,
            });
        }

        let mut expanded = String::new();
        self.expand(template, &mut expanded)?;

        buf.push_str(&self.input[self.last_append..start]);
        buf.push_str(&expanded);

        self.last_append = end;

        Ok(self)
    }

    /// Appends to `buf` the text that follows the last appended match.
    pub fn append_tail(&mut self, buf: &mut String) {
        buf.push_str(&self.input[self.last_append..]);
    }

    /// Resets the matcher and replaces every match with the expansion of
    /// `template`.
    pub fn replace_all(
        &mut self,
        template: &str,
    ) -> Result<String, MatchError> {
        self.replace(template, true)
    }

    /// Resets the matcher and replaces the first match with the expansion
    /// of `template`.
    pub fn replace_first(
        &mut self,
        template: &str,
    ) -> Result<String, MatchError> {
        self.replace(template, false)
    }

    /// Like [`Matcher::replace_all`], but the template for each match is
    /// computed by `replacer`.
    pub fn replace_all_with<F>(
        &mut self,
        replacer: F,
    ) -> Result<String, MatchError>
    where
        F: FnMut(&MatchResult<'h>) -> String,
    {
        self.replace_with(replacer, true)
    }

    /// Like [`Matcher::replace_first`], but the template is computed by
    /// `replacer`.
    pub fn replace_first_with<F>(
        &mut self,
        replacer: F,
    ) -> Result<String, MatchError>
    where
        F: FnMut(&MatchResult<'h>) -> String,
    {
        self.replace_with(replacer, false)
    }

    fn replace(
        &mut self,
        template: &str,
        all: bool,
    ) -> Result<String, MatchError> {
        self.reset();

        if !self.find() {
            return Ok(self.input.to_string());
        }

        let mut buf = String::with_capacity(self.input.len());

        loop {
            self.append_replacement(&mut buf, template)?;
            if !all || !self.find() {
                break;
            }
        }

        self.append_tail(&mut buf);
        Ok(buf)
    }

    fn replace_with<F>(
        &mut self,
        mut replacer: F,
        all: bool,
    ) -> Result<String, MatchError>
    where
        F: FnMut(&MatchResult<'h>) -> String,
    {
        self.reset();

        if !self.find() {
            return Ok(self.input.to_string());
        }

        let mut buf = String::with_capacity(self.input.len());

        loop {
            let template = replacer(&self.to_match_result()?);
            self.append_replacement(&mut buf, &template)?;
            if !all || !self.find() {
                break;
            }
        }

        self.append_tail(&mut buf);
        Ok(buf)
    }

    /// Escapes `s` so that it can be used as a replacement template that
    /// produces `s` literally.
    ///
    /// ```
    /// # use regulus::Matcher;
    /// assert_eq!(Matcher::quote_replacement(r"$1\n"), r"\$1\\n");
    /// ```
    pub fn quote_replacement(s: &str) -> String {
        if !s.contains(['\\', '$']) {
            return s.to_string();
        }
        let mut quoted = String::with_capacity(s.len() + 4);
        for c in s.chars() {
            if c == '\\' || c == '$' {
                quoted.push('\\');
            }
            quoted.push(c);
        }
        quoted
    }
}
