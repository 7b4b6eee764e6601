//! Bash helper function templates.
//!
//! Helpers run inside the completion function and share its locals through
//! dynamic scoping: `cur`, `COMPREPLY`, `POSITIONALS`, `OPTION_VALUES`,
//! `HAVING_OPTIONS`, `END_OF_OPTIONS`, `COMMAND_PATH` and
//! `COMPLETING_OPTION`. Completers append to `COMPREPLY`.

use crate::helpers::HelperDef;

pub static SET_OPTION: HelperDef = HelperDef {
    name: "set_option",
    code: r#"__@@_set_option() {
  HAVING_OPTIONS+="$1 "
  OPTION_VALUES[$1]="$2"
}"#,
    deps: &[],
};

pub static ADD_POSITIONAL: HelperDef = HelperDef {
    name: "add_positional",
    code: r#"__@@_add_positional() {
  POSITIONALS+=("$1")
#ifdef SUBCOMMANDS
  __@@_resolve_subcommand "$1"
#endif
}"#,
    deps: &[],
};

pub static PARSE_COMMANDLINE: HelperDef = HelperDef {
    name: "parse_commandline",
    code: r#"__@@_parse_commandline() {
  POSITIONALS=()
  OPTION_VALUES=()
  HAVING_OPTIONS=' '
  END_OF_OPTIONS=0
  COMMAND_PATH=''
  COMPLETING_OPTION=''

  local i=1 arg key j
  while (( i < cword )); do
    arg="${words[i]}"
    (( i++ ))

    if (( END_OF_OPTIONS )); then
      __@@_add_positional "$arg"
      continue
    fi

    case "$arg" in
      --)
        END_OF_OPTIONS=1
        continue;;
      -?*) ;;
      *)
        __@@_add_positional "$arg"
        continue;;
    esac

#ifdef LONG_OPTIONS
    if [[ "$arg" == --?*=* ]] && __@@_lookup_option "${arg%%=*}" && [[ "$REPLY_KIND" != n ]]; then
      __@@_set_option "$REPLY" "${arg#*=}"
      continue
    fi
#endif
#ifdef OLD_OPTIONS
    if [[ "$arg" == -[!-]?*=* ]] && __@@_lookup_option "${arg%%=*}" && [[ "$REPLY_KIND" != n ]]; then
      __@@_set_option "$REPLY" "${arg#*=}"
      continue
    fi
#endif

    if __@@_lookup_option "$arg"; then
      if [[ "$REPLY_KIND" != r ]]; then
        __@@_set_option "$REPLY" ''
      elif (( i < cword )); then
        __@@_set_option "$REPLY" "${words[i]}"
        (( i++ ))
      else
        COMPLETING_OPTION="$REPLY"
      fi
      continue
    fi

    [[ "$arg" == --* ]] && continue

#ifdef SHORT_OPTIONS
    for (( j = 1; j < ${#arg}; j++ )); do
      __@@_lookup_option "-${arg:j:1}" || break
      key="$REPLY"
      if [[ "$REPLY_KIND" == n ]]; then
        __@@_set_option "$key" ''
#ifdef OPTION_STACKING
        continue
#else
        break
#endif
      fi
      if (( j + 1 < ${#arg} )); then
        __@@_set_option "$key" "${arg:j+1}"
      elif [[ "$REPLY_KIND" == o ]]; then
        __@@_set_option "$key" ''
      elif (( i < cword )); then
        __@@_set_option "$key" "${words[i]}"
        (( i++ ))
      else
        COMPLETING_OPTION="$key"
      fi
      break
    done
#endif
  done
#ifdef DEBUG

  printf '\n[%s] path=%q positionals=(%s) having=%q completing=%q\n' \
    "${FUNCNAME[1]}" "$COMMAND_PATH" "${POSITIONALS[*]}" "$HAVING_OPTIONS" "$COMPLETING_OPTION" >&2
#endif
}"#,
    deps: &[&SET_OPTION, &ADD_POSITIONAL],
};

pub static SPLIT_INLINE_VALUE: HelperDef = HelperDef {
    name: "split_inline_value",
    code: r#"__@@_split_inline_value() {
  [[ -n "$COMPLETING_OPTION" ]] && return 0
  (( END_OF_OPTIONS )) && return 0
  [[ "$cur" == -?* ]] || return 0

#ifdef LONG_OPTIONS
  if [[ "$cur" == --?*=* ]] && __@@_lookup_option "${cur%%=*}" && [[ "$REPLY_KIND" != n ]]; then
    COMPLETING_OPTION="$REPLY"
    cur="${cur#*=}"
    return 0
  fi
#endif
#ifdef OLD_OPTIONS
  if [[ "$cur" == -[!-]?*=* ]] && __@@_lookup_option "${cur%%=*}" && [[ "$REPLY_KIND" != n ]]; then
    COMPLETING_OPTION="$REPLY"
    cur="${cur#*=}"
    return 0
  fi
  __@@_lookup_option "$cur" && return 0
#endif
#ifdef SHORT_OPTIONS
  [[ "$cur" == --* ]] && return 0

  local j
  for (( j = 1; j < ${#cur}; j++ )); do
    __@@_lookup_option "-${cur:j:1}" || return 0
    if [[ "$REPLY_KIND" == n ]]; then
#ifdef OPTION_STACKING
      continue
#else
      return 0
#endif
    fi
    (( j + 1 < ${#cur} )) || return 0
    COMPLETING_OPTION="$REPLY"
    VALUE_PREFIX="${cur:0:j+1}"
    cur="${cur:j+1}"
    return 0
  done
#endif
}"#,
    deps: &[],
};

pub static HAS_OPTION: HelperDef = HelperDef {
    name: "has_option",
    code: r#"__@@_has_option() {
  local key
  for key; do
    [[ "$HAVING_OPTIONS" == *" $key "* ]] && return 0
  done
  return 1
}"#,
    deps: &[],
};

pub static OPTION_IS: HelperDef = HelperDef {
    name: "option_is",
    code: r#"__@@_option_is() {
  local -a keys=()
  while (( $# )) && [[ "$1" != -- ]]; do
    keys+=("$1")
    shift
  done
  shift

  local key value
  for key in "${keys[@]}"; do
    __@@_has_option "$key" || continue
    for value; do
      [[ "${OPTION_VALUES[$key]}" == "$value" ]] && return 0
    done
  done
  return 1
}"#,
    deps: &[&HAS_OPTION],
};

pub static COMPLETE_OPTIONS: HelperDef = HelperDef {
    name: "complete_options",
    code: r#"__@@_complete_options() {
  local opt
  for opt; do
    [[ "$opt" == "$cur"* ]] && COMPREPLY+=("$opt")
  done
  for opt in "${COMPREPLY[@]}"; do
    if [[ "$opt" == *= ]]; then
      compopt -o nospace
      break
    fi
  done
}"#,
    deps: &[],
};

pub static COMPLETE_LIST: HelperDef = HelperDef {
    name: "complete_list",
    code: r#"__@@_complete_list() {
  local item
  for item; do
    [[ "$item" == "$cur"* ]] && COMPREPLY+=("$item")
  done
}"#,
    deps: &[],
};

pub static COMPLETE_RANGE: HelperDef = HelperDef {
    name: "complete_range",
    code: r#"__@@_complete_range() {
  local i
  for (( i = $1; i <= $2; i += $3 )); do
    [[ "$i" == "$cur"* ]] && COMPREPLY+=("$i")
  done
}"#,
    deps: &[],
};

pub static COMPGEN: HelperDef = HelperDef {
    name: "compgen",
    code: r#"__@@_compgen() {
  local IFS=$'\n'
  COMPREPLY+=($(compgen "$@" -- "$cur"))
}"#,
    deps: &[],
};

pub static APPEND: HelperDef = HelperDef {
    name: "append",
    code: r#"__@@_append() {
  local -a saved=("${COMPREPLY[@]}")
  COMPREPLY=()
  "$@"
  COMPREPLY=("${saved[@]}" "${COMPREPLY[@]}")
}"#,
    deps: &[],
};

pub static EXEC: HelperDef = HelperDef {
    name: "exec",
    code: r#"__@@_exec() {
  local item
  while IFS= read -r item; do
    item="${item%%$'\t'*}"
    [[ "$item" == "$cur"* ]] && COMPREPLY+=("$item")
  done < <(eval "$1" 2>/dev/null)
}"#,
    deps: &[],
};

pub static EXEC_FAST: HelperDef = HelperDef {
    name: "exec_fast",
    code: r#"__@@_exec_fast() {
  local IFS=$'\n'
  COMPREPLY+=($(compgen -W "$(eval "$1" 2>/dev/null)" -- "$cur"))
}"#,
    deps: &[],
};

pub static HISTORY: HelperDef = HelperDef {
    name: "history",
    code: r#"__@@_history() {
  local item
  while IFS= read -r item; do
    [[ "$item" == "$cur"* ]] && COMPREPLY+=("$item")
  done < <(grep -E -o -- "$1" "${HISTFILE:-$HOME/.bash_history}" 2>/dev/null | sort -u)
}"#,
    deps: &[],
};

pub static COMPLETE_PREFIX: HelperDef = HelperDef {
    name: "complete_prefix",
    code: r#"__@@_complete_prefix() {
  local prefix="$1"
  shift
  if [[ "$cur" != "$prefix"* ]]; then
    if [[ "$prefix" == "$cur"* ]]; then
      COMPREPLY+=("$prefix")
      compopt -o nospace
    fi
    return 0
  fi

  local -a saved=("${COMPREPLY[@]}")
  COMPREPLY=()
  local cur="${cur:${#prefix}}"
  "$@"
  local item
  for item in "${COMPREPLY[@]}"; do
    saved+=("$prefix$item")
  done
  COMPREPLY=("${saved[@]}")
}"#,
    deps: &[],
};

pub static COMPLETE_LIST_OF: HelperDef = HelperDef {
    name: "complete_list_of",
    code: r#"__@@_complete_list_of() {
  local sep="$1" duplicates="$2"
  shift 2

  local head='' last="$cur"
  if [[ "$cur" == *"$sep"* ]]; then
    head="${cur%"$sep"*}$sep"
    last="${cur##*"$sep"}"
  fi
  local -a used=()
  [[ -n "$head" ]] && IFS="$sep" read -r -a used <<< "${head%"$sep"}"

  local -a saved=("${COMPREPLY[@]}")
  COMPREPLY=()
  local cur="$last"
  "$@"

  local item seen
  for item in "${COMPREPLY[@]}"; do
    if (( ! duplicates )); then
      for seen in "${used[@]}"; do
        [[ "$seen" == "$item" ]] && continue 2
      done
    fi
    saved+=("$head$item")
  done
  COMPREPLY=("${saved[@]}")
  compopt -o nospace
}"#,
    deps: &[],
};

pub static COMPLETE_KEY_VALUE_LIST: HelperDef = HelperDef {
    name: "complete_key_value_list",
    code: r#"__@@_complete_key_value_list() {
  local sep="$1" pair="$2" values="$3"
  shift 3

  local head='' last="$cur"
  if [[ "$cur" == *"$sep"* ]]; then
    head="${cur%"$sep"*}$sep"
    last="${cur##*"$sep"}"
  fi

  local -a saved=("${COMPREPLY[@]}") used=()
  local rest="$head" part
  while [[ -n "$rest" ]]; do
    part="${rest%%"$sep"*}"
    rest="${rest#*"$sep"}"
    used+=("${part%%"$pair"*}")
  done

  COMPREPLY=()
  local item key skip
  if [[ "$last" == *"$pair"* ]]; then
    key="${last%%"$pair"*}"
    local cur="${last#*"$pair"}"
    "$values" "$key"
    for item in "${COMPREPLY[@]}"; do
      saved+=("$head$key$pair$item")
    done
  else
    for item; do
      [[ "$item" == "$last"* ]] || continue
      skip=0
      for key in "${used[@]}"; do
        [[ "$key" == "${item%"$pair"}" ]] && skip=1 && break
      done
      (( skip )) || saved+=("$head$item")
    done
  fi
  COMPREPLY=("${saved[@]}")
  compopt -o nospace
}"#,
    deps: &[],
};

pub static COMPLETE_IN_DIRECTORY: HelperDef = HelperDef {
    name: "complete_in_directory",
    code: r#"__@@_complete_in_directory() {
  local dir="$1"
  shift
  builtin pushd -- "$dir" &>/dev/null || return 0
  "$@"
  builtin popd &>/dev/null
}"#,
    deps: &[],
};

pub static COMPLETE_IGNORING: HelperDef = HelperDef {
    name: "complete_ignoring",
    code: r#"__@@_complete_ignoring() {
  local -a globs=()
  while (( $# )) && [[ "$1" != -- ]]; do
    globs+=("$1")
    shift
  done
  shift

  local -a saved=("${COMPREPLY[@]}")
  COMPREPLY=()
  "$@"
  local item glob
  for item in "${COMPREPLY[@]}"; do
    for glob in "${globs[@]}"; do
      [[ "${item##*/}" == $glob ]] && continue 2
    done
    saved+=("$item")
  done
  COMPREPLY=("${saved[@]}")
}"#,
    deps: &[],
};
