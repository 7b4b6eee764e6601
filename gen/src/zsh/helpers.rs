//! Zsh helper function templates.

use crate::helpers::HelperDef;

/// `__<prog>_query QUERY ARGS...` walks the words saved by the root
/// function in `__<prog>_words`, the whole command line up to the cursor,
/// and answers `has_option KEY...` or `option_is KEY... -- VALUE...`.
///
/// Options are resolved with `__<prog>_lookup_option PATH SPELLING` for the
/// subcommand path selected so far, so conditions see options of every
/// command level, not just the one `_arguments` narrowed `$words` to.
pub static QUERY: HelperDef = HelperDef {
    name: "query",
    code: r#"__@@_query() {
  local query=$1
  shift
  local -a having keys values
  local word key cmd_path= awaiting= REPLY i=2 j n positionals=0 end_of_options=0
  while (( i <= $#__@@_words )); do
    word=$__@@_words[i]
    (( i++ ))
    if [[ -n $awaiting ]]; then
      having+=($awaiting) keys+=($awaiting) values+=("$word")
      awaiting=
      continue
    fi
    if (( end_of_options )) || [[ $word != -?* ]]; then
      (( positionals++ ))
#ifdef SUBCOMMANDS
      __@@_resolve_subcommand "$cmd_path" $positionals "$word" && cmd_path=$REPLY
#endif
      continue
    fi
    if [[ $word == -- ]]; then
      end_of_options=1
      continue
    fi
    if [[ $word == -?*=* ]] && __@@_lookup_option "$cmd_path" "${word%%=*}" && [[ $REPLY != *:n ]]; then
      having+=(${REPLY%:*}) keys+=(${REPLY%:*}) values+=("${word#*=}")
      continue
    fi
    if __@@_lookup_option "$cmd_path" "$word"; then
      case $REPLY in
        (*:r) awaiting=${REPLY%:*};;
        (*:o) having+=(${REPLY%:*}) keys+=(${REPLY%:*}) values+=('');;
        (*) having+=(${REPLY%:*});;
      esac
      continue
    fi
    [[ $word == --* ]] && continue
#ifdef SHORT_OPTIONS
    for (( j = 2; j <= $#word; j++ )); do
      __@@_lookup_option "$cmd_path" "-$word[j]" || break
      if [[ $REPLY == *:n ]]; then
        having+=(${REPLY%:*})
#ifdef OPTION_STACKING
        continue
#else
        break
#endif
      fi
      if (( j < $#word )); then
        having+=(${REPLY%:*}) keys+=(${REPLY%:*}) values+=("$word[j+1,-1]")
      elif [[ $REPLY == *:r ]]; then
        awaiting=${REPLY%:*}
      else
        having+=(${REPLY%:*}) keys+=(${REPLY%:*}) values+=('')
      fi
      break
    done
#endif
  done
#ifdef DEBUG
  print -ru2 -- "[$query $*] path=$cmd_path having=(${having[*]}) keys=(${keys[*]}) values=(${values[*]})"
#endif

  case $query in
    (has_option)
      for key in "$@"; do
        (( ${having[(Ie)$key]} )) && return 0
      done
      ;;
    (option_is)
      local sep=${argv[(i)--]}
      local -a wanted
      wanted=("${(@)argv[sep+1,-1]}")
      for key in "${(@)argv[1,sep-1]}"; do
        for (( n = $#keys; n > 0; n-- )); do
          if [[ $keys[n] == $key ]]; then
            (( ${wanted[(Ie)$values[n]]} )) && return 0
            break
          fi
        done
      done
      ;;
  esac
  return 1
}"#,
    deps: &[],
};

/// Offers the first field of each `value<TAB>description` line printed by
/// the command `$1`.
pub static EXEC: HelperDef = HelperDef {
    name: "exec",
    code: r#"__@@_exec() {
  local -a items
  local line
  for line in ${(f)"$(eval "$1" 2>/dev/null)"}; do
    line=${line//:/\\:}
    items+=("${line/$'\t'/:}")
  done
  _describe -t values value items
}"#,
    deps: &[],
};

pub static EXEC_FAST: HelperDef = HelperDef {
    name: "exec_fast",
    code: r#"__@@_exec_fast() {
  local -a items
  items=(${(f)"$(eval "$1" 2>/dev/null)"})
  compadd -a items
}"#,
    deps: &[],
};

pub static RANGE: HelperDef = HelperDef {
    name: "range",
    code: r#"__@@_range() {
  local -a items
  local i
  for (( i = $1; i <= $2; i += $3 )); do
    items+=($i)
  done
  compadd -a items
}"#,
    deps: &[],
};

pub static HISTORY: HelperDef = HelperDef {
    name: "history",
    code: r#"__@@_history() {
  local -a items
  items=(${(u)${(f)"$(fc -ln 1 2>/dev/null | grep -E -o -- "$1")"}})
  compadd -a items
}"#,
    deps: &[],
};

pub static LOGIN_SHELLS: HelperDef = HelperDef {
    name: "login_shells",
    code: r#"__@@_login_shells() {
  local -a items
  items=(${${(f)"$(</etc/shells)"}:#(\#*|)})
  _wanted shells expl shell compadd -a items
}"#,
    deps: &[],
};

pub static CHARSETS: HelperDef = HelperDef {
    name: "charsets",
    code: r#"__@@_charsets() {
  local -a items
  items=(${(f)"$(locale -m 2>/dev/null)"})
  _wanted charsets expl charset compadd -a items
}"#,
    deps: &[],
};
