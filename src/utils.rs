/// Pick the singular or plural form to agree with `count`.
pub fn plural<'a>(count: u32, one: &'a str, many: &'a str) -> &'a str {
  if count == 1 { one } else { many }
}

pub fn winrate(wins: u32, games: u32) -> f64 {
  if games == 0 {
    return 0.0;
  }
  f64::from(wins) / f64::from(games) * 100.0
}

/// Uppercase the first letter of every word, lowercase the rest.
/// A word starts after any non-alphabetic character.
pub fn title_case(input: &str) -> String {
  let mut out = String::with_capacity(input.len());
  let mut boundary = true;

  for ch in input.chars() {
    if ch.is_alphabetic() {
      if boundary {
        out.extend(ch.to_uppercase());
      } else {
        out.extend(ch.to_lowercase());
      }
      boundary = false;
    } else {
      out.push(ch);
      boundary = true;
    }
  }

  out
}
